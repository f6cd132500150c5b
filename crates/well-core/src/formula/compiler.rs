//! Compilación del conjunto de fórmulas.
//!
//! Cada definición `destino=expresión` se normaliza (etiquetas → ids), se
//! valida sintácticamente y se expande inlineando, entre paréntesis, a todo
//! destino que referencie. El resultado por destino es una expresión cerrada
//! y su conjunto de dependencias hoja.
//!
//! Los ciclos se detectan con un DFS sobre la pila de expansión: todo destino
//! en el ciclo, o que dependa de él, queda en `broken` con `FormulaError::Cycle`.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use log::{debug, warn};
use well_domain::fields::{is_bucket_variant_target, is_input_field, LIQUID_PER_BUCKET};
use well_domain::formula::split_definition;
use well_domain::FormulaDefinition;

use super::labels::substitute_labels;
use super::lexer::{tokenize, TokenKind};
use super::parser::{parse, Expr};
use crate::errors::FormulaError;

/// Fórmula lista para evaluar.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    pub target: String,
    /// Expresión cerrada: no contiene ningún destino inlineable.
    pub expanded: String,
    pub expr: Expr,
    pub leaf_deps: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompiledFormulas {
    formulas: IndexMap<String, CompiledFormula>,
    broken: IndexMap<String, FormulaError>,
    rejected: Vec<FormulaError>,
}

impl CompiledFormulas {
    pub fn get(&self, target: &str) -> Option<&CompiledFormula> {
        self.formulas.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledFormula> {
        self.formulas.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.formulas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Destinos que no compilaron (sintaxis, ciclo o dependencia rota).
    pub fn broken(&self) -> &IndexMap<String, FormulaError> {
        &self.broken
    }

    /// Definiciones descartadas antes de tener destino válido.
    pub fn rejected(&self) -> &[FormulaError] {
        &self.rejected
    }

    /// Vista `destino → expresión expandida`.
    pub fn expanded_exprs(&self) -> IndexMap<&str, &str> {
        self.formulas.iter().map(|(k, f)| (k.as_str(), f.expanded.as_str())).collect()
    }

    /// Vista `destino → dependencias hoja`.
    pub fn leaf_deps(&self) -> IndexMap<&str, &BTreeSet<String>> {
        self.formulas.iter().map(|(k, f)| (k.as_str(), &f.leaf_deps)).collect()
    }
}

pub struct FormulaCompiler;

impl FormulaCompiler {
    /// Compila el conjunto completo. Nunca falla: los errores quedan
    /// registrados por destino en el resultado.
    pub fn compile(definitions: &[FormulaDefinition]) -> CompiledFormulas {
        let mut ordered: Vec<&FormulaDefinition> = definitions.iter().collect();
        ordered.sort_by_key(|d| d.id);

        let mut out = CompiledFormulas::default();
        let mut sources: IndexMap<String, String> = IndexMap::new();

        for def in ordered {
            match normalize(def) {
                Ok((target, expr)) => {
                    if let Some(prev) = sources.insert(target.clone(), expr) {
                        warn!("formula.duplicate target={} id={} replaces='{}'", target, def.id, prev);
                    }
                }
                Err(e) => {
                    warn!("formula.rejected id={} error={}", def.id, e);
                    out.rejected.push(e);
                }
            }
        }

        let mut expander = Expander { sources: &sources, done: HashMap::new(), stack: Vec::new() };
        for target in sources.keys() {
            match expander.expand(target) {
                Ok(expanded) => match parse(&expanded) {
                    Ok(expr) => {
                        let leaf_deps = expr.variables();
                        debug!("formula.compiled target={} deps={:?}", target, leaf_deps);
                        out.formulas.insert(target.clone(),
                                            CompiledFormula { target: target.clone(), expanded, expr, leaf_deps });
                    }
                    Err(reason) => {
                        out.broken.insert(target.clone(), FormulaError::Syntax { target: target.clone(), reason });
                    }
                },
                Err(e) => {
                    warn!("formula.broken target={} error={}", target, e);
                    out.broken.insert(target.clone(), e);
                }
            }
        }
        out
    }
}

/// Divide la definición y sustituye etiquetas en ambos lados.
fn normalize(def: &FormulaDefinition) -> Result<(String, String), FormulaError> {
    let parse_err = |reason: String| FormulaError::Parse { definition: def.formula.clone(), reason };
    let (lhs, rhs) = split_definition(&def.formula).map_err(|e| parse_err(e.to_string()))?;

    let target = substitute_labels(lhs);
    let toks = tokenize(&target).map_err(parse_err)?;
    let target = match toks.as_slice() {
        [tok] => match &tok.kind {
            TokenKind::Ident(name) => name.clone(),
            _ => return Err(parse_err(format!("destino inválido: {lhs}"))),
        },
        _ => return Err(parse_err(format!("destino inválido: {lhs}"))),
    };
    if is_input_field(&target) {
        return Err(parse_err(format!("el destino {target} es un campo de entrada")));
    }
    Ok((target, substitute_labels(rhs)))
}

/// Destinos que nunca se inlinean: la familia de líquido por cubeta se
/// resuelve por registro y se lee como valor ya calculado.
fn is_inlinable(name: &str) -> bool {
    !is_bucket_variant_target(name) && name != LIQUID_PER_BUCKET
}

struct Expander<'a> {
    sources: &'a IndexMap<String, String>,
    done: HashMap<String, Result<String, FormulaError>>,
    stack: Vec<String>,
}

impl<'a> Expander<'a> {
    fn expand(&mut self, target: &str) -> Result<String, FormulaError> {
        if let Some(done) = self.done.get(target) {
            return done.clone();
        }
        if let Some(pos) = self.stack.iter().position(|t| t == target) {
            let mut path = self.stack[pos..].to_vec();
            path.push(target.to_string());
            return Err(FormulaError::Cycle { target: target.to_string(), path });
        }

        self.stack.push(target.to_string());
        let result = self.expand_source(target);
        self.stack.pop();
        self.done.insert(target.to_string(), result.clone());
        result
    }

    fn expand_source(&mut self, target: &str) -> Result<String, FormulaError> {
        let sources = self.sources;
        let src = match sources.get(target) {
            Some(s) => s.as_str(),
            None => return Err(FormulaError::Syntax { target: target.to_string(), reason: "destino sin expresión".into() }),
        };
        let tokens = tokenize(src).map_err(|reason| FormulaError::Syntax { target: target.to_string(), reason })?;
        parse(src).map_err(|reason| FormulaError::Syntax { target: target.to_string(), reason })?;

        let mut out = String::with_capacity(src.len());
        let mut cursor = 0;
        for tok in &tokens {
            let TokenKind::Ident(name) = &tok.kind else { continue };
            if !self.sources.contains_key(name) || (!is_inlinable(name) && name != target) {
                continue;
            }
            let inner = self.expand(name).map_err(|e| propagate(e, target, name))?;
            out.push_str(&src[cursor..tok.span.start]);
            out.push('(');
            out.push_str(&inner);
            out.push(')');
            cursor = tok.span.end;
        }
        out.push_str(&src[cursor..]);
        Ok(out)
    }
}

/// Reexpresa el error de una dependencia desde el punto de vista de `target`.
fn propagate(err: FormulaError, target: &str, dependency: &str) -> FormulaError {
    match err {
        FormulaError::Cycle { path, .. } => FormulaError::Cycle { target: target.to_string(), path },
        _ => FormulaError::BrokenDependency { target: target.to_string(), dependency: dependency.to_string() },
    }
}
