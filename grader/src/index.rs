//! Call-site and lambda indices of a program.
//!
//! Both indices come from one pre-order walk over the program's expressions,
//! so call sites of a name and lambdas appear in source order.

use indexmap::IndexMap;
use treeval::ast::{Expr, Module, Param, StatementKind};

/// Import bindings of a program: bound name to fully qualified target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imports {
    aliases: IndexMap<String, String>,
}

impl Imports {
    pub fn from_module(module: &Module) -> Self {
        let mut aliases = IndexMap::new();
        for stmt in &module.body {
            match &stmt.kind {
                StatementKind::Import(names) => {
                    for alias in names {
                        aliases.insert(alias.bound_name().to_string(), alias.name.clone());
                    }
                }
                StatementKind::ImportFrom { module, names } => {
                    for alias in names {
                        aliases.insert(
                            alias.bound_name().to_string(),
                            format!("{}.{}", module, alias.name),
                        );
                    }
                }
                _ => {}
            }
        }
        Imports { aliases }
    }

    /// Resolves the head of a dotted name through the import aliases.
    pub fn qualify(&self, dotted: &str) -> String {
        let (head, rest) = match dotted.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (dotted, None),
        };
        match (self.aliases.get(head), rest) {
            (Some(target), Some(rest)) => format!("{}.{}", target, rest),
            (Some(target), None) => target.clone(),
            (None, _) => dotted.to_string(),
        }
    }

    /// How this program spells a qualified name: `numpy.mean` becomes
    /// `np.mean` after `import numpy as np`.
    pub fn spelling(&self, qualified: &str) -> String {
        if let Some((bound, _)) = self.aliases.iter().find(|(_, target)| *target == qualified) {
            return bound.clone();
        }
        let mut split = qualified.len();
        while let Some(dot) = qualified[..split].rfind('.') {
            let (prefix, rest) = qualified.split_at(dot);
            if let Some((bound, _)) = self.aliases.iter().find(|(_, target)| *target == prefix) {
                return format!("{}{}", bound, rest);
            }
            split = dot;
        }
        qualified.to_string()
    }
}

/// One syntactic invocation of a named function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub name: String,
    pub line: usize,
    pub args: Vec<Expr>,
    pub keywords: IndexMap<String, Expr>,
}

/// A lambda definition in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaRecord {
    /// The defining `Expr::Lambda` node.
    pub node: Expr,
    pub params: Vec<Param>,
    pub body: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramIndex {
    pub calls: IndexMap<String, Vec<CallSite>>,
    pub lambdas: Vec<LambdaRecord>,
}

impl ProgramIndex {
    pub fn build(module: &Module, imports: &Imports) -> Self {
        let mut index = ProgramIndex::default();
        for expr in module.expressions() {
            index.visit(expr, imports);
        }
        index
    }

    pub fn calls_of(&self, name: &str) -> &[CallSite] {
        self.calls.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn visit(&mut self, expr: &Expr, imports: &Imports) {
        match expr {
            Expr::Call(call) => {
                if let Some(dotted) = call.func.dotted_name() {
                    let name = imports.qualify(&dotted);
                    let site = CallSite {
                        name: name.clone(),
                        line: call.line,
                        args: call.args.clone(),
                        keywords: call
                            .keywords
                            .iter()
                            .map(|kw| (kw.name.clone(), kw.value.clone()))
                            .collect(),
                    };
                    self.calls.entry(name).or_default().push(site);
                }
                self.visit(&call.func, imports);
                for arg in &call.args {
                    self.visit(arg, imports);
                }
                for kw in &call.keywords {
                    self.visit(&kw.value, imports);
                }
            }
            Expr::Lambda(lambda) => {
                self.lambdas.push(LambdaRecord {
                    node: expr.clone(),
                    params: lambda.params.clone(),
                    body: (*lambda.body).clone(),
                    line: lambda.line,
                });
                for default in lambda.params.iter().filter_map(|p| p.default.as_ref()) {
                    self.visit(default, imports);
                }
                self.visit(&lambda.body, imports);
            }
            Expr::Attribute { value, .. } => self.visit(value, imports),
            Expr::BinOp { left, right, .. } => {
                self.visit(left, imports);
                self.visit(right, imports);
            }
            Expr::UnaryOp { operand, .. } => self.visit(operand, imports),
            Expr::List(items) | Expr::Tuple(items) => {
                for item in items {
                    self.visit(item, imports);
                }
            }
            Expr::Constant(_) | Expr::Name(_) => {}
        }
    }
}
