use std::collections::BTreeMap;
use std::process::exit;

use chrono::NaiveDate;
use well_core::FormulaCompiler;
use well_domain::{Level, Node, NodeKey, OilReportFields, PathKey, ReportFields};
use well_persistence::{build_store_from_env, EntityStore, PoolProvider, SequenceResolver};

const USAGE: &str = "Uso:
  well-cli formula list
  well-cli formula upsert <DEST=EXPR>...
  well-cli tree [<segmento>...]
  well-cli resolve <segmento>...
  well-cli delete --level <nivel> --id <N>
  well-cli oil-report --well <N> --date <AAAA-MM-DD> [--set campo=valor]...";

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = args.first() else {
        eprintln!("{USAGE}");
        exit(2);
    };
    let store = match build_store_from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[well-cli] store error: {e}");
            exit(5);
        }
    };
    let rest = &args[1..];
    match cmd.as_str() {
        "formula" => formula(&store, rest),
        "tree" => tree(&store, rest),
        "resolve" => resolve(&store, rest),
        "delete" => delete(&store, rest),
        "oil-report" => oil_report(&store, rest),
        _ => {
            eprintln!("{USAGE}");
            exit(2);
        }
    }
}

fn formula(store: &EntityStore<PoolProvider>, args: &[String]) {
    match args.first().map(String::as_str) {
        Some("list") => {
            let defs = match store.load_definitions() {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("[well-cli formula] error: {e}");
                    exit(5);
                }
            };
            let compiled = FormulaCompiler::compile(&defs);
            for d in &defs {
                println!("{:>4}  {}", d.id, d.formula);
            }
            for (target, err) in compiled.broken() {
                println!("roto: {target}: {err}");
            }
            for err in compiled.rejected() {
                println!("descartado: {err}");
            }
        }
        Some("upsert") if args.len() > 1 => match store.upsert_formulas(&args[1..]) {
            Ok(n) => println!("cambiadas: {n}"),
            Err(e) => {
                eprintln!("[well-cli formula] rechazado: {e}");
                exit(4);
            }
        },
        _ => {
            eprintln!("{USAGE}");
            exit(2);
        }
    }
}

fn path_of(args: &[String]) -> Vec<PathKey> {
    args.iter().map(|s| PathKey::parse(s)).collect()
}

fn print_node(node: &Node) {
    match serde_json::to_string(node) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[well-cli] serialize error: {e}"),
    }
}

fn tree(store: &EntityStore<PoolProvider>, args: &[String]) {
    let children = if args.is_empty() {
        store.list_areas().map(|areas| areas.into_iter().map(Node::Area).collect::<Vec<_>>())
    } else {
        match SequenceResolver::new(store).resolve(&path_of(args)) {
            Ok(Some(node)) => store.list_children(node.level(), &NodeKey::Id(node.id())),
            Ok(None) => {
                eprintln!("[well-cli tree] ruta no encontrada");
                exit(4);
            }
            Err(e) => Err(e),
        }
    };
    match children {
        Ok(nodes) => {
            for n in &nodes {
                println!("{:<12} {:>6}  {}", n.level(), n.id(), n.natural_key());
            }
        }
        Err(e) => {
            eprintln!("[well-cli tree] error: {e}");
            exit(5);
        }
    }
}

fn resolve(store: &EntityStore<PoolProvider>, args: &[String]) {
    if args.is_empty() {
        eprintln!("{USAGE}");
        exit(2);
    }
    match SequenceResolver::new(store).resolve(&path_of(args)) {
        Ok(Some(node)) => print_node(&node),
        Ok(None) => {
            eprintln!("[well-cli resolve] no encontrado");
            exit(4);
        }
        Err(e) => {
            eprintln!("[well-cli resolve] error: {e}");
            exit(5);
        }
    }
}

fn delete(store: &EntityStore<PoolProvider>, args: &[String]) {
    let mut level: Option<Level> = None;
    let mut id: Option<i64> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--level" => {
                i += 1;
                if i < args.len() {
                    level = args[i].parse().ok();
                }
            }
            "--id" => {
                i += 1;
                if i < args.len() {
                    id = args[i].parse().ok();
                }
            }
            _ => {}
        }
        i += 1;
    }
    let (Some(level), Some(id)) = (level, id) else {
        eprintln!("{USAGE}");
        exit(2);
    };
    match store.delete(level, id) {
        Ok(n) => println!("borradas: {n} filas"),
        Err(e) => {
            eprintln!("[well-cli delete] error: {e}");
            exit(4);
        }
    }
}

fn oil_report(store: &EntityStore<PoolProvider>, args: &[String]) {
    let mut well: Option<i64> = None;
    let mut date: Option<NaiveDate> = None;
    let mut values = BTreeMap::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--well" => {
                i += 1;
                if i < args.len() {
                    well = args[i].parse().ok();
                }
            }
            "--date" => {
                i += 1;
                if i < args.len() {
                    date = NaiveDate::parse_from_str(&args[i], "%Y-%m-%d").ok();
                }
            }
            "--set" => {
                i += 1;
                if let Some((k, v)) = args.get(i).and_then(|kv| kv.split_once('=')) {
                    values.insert(k.trim().to_string(), v.to_string());
                }
            }
            _ => {}
        }
        i += 1;
    }
    let (Some(well), Some(date)) = (well, date) else {
        eprintln!("{USAGE}");
        exit(2);
    };
    if !values.is_empty() {
        let fields = OilReportFields { values, ..Default::default() };
        if let Err(e) = store.upsert_report(well, date, &ReportFields::Oil(fields)) {
            eprintln!("[well-cli oil-report] rechazado: {e}");
            exit(4);
        }
    }
    match store.oil_report(well, date) {
        Ok(Some(report)) => print_node(&Node::OilReport(report)),
        Ok(None) => {
            eprintln!("[well-cli oil-report] sin reporte para {well} {date}");
            exit(4);
        }
        Err(e) => {
            eprintln!("[well-cli oil-report] error: {e}");
            exit(5);
        }
    }
}
