use crate::ast::{BinaryOp, CmpOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{KnlError, Span};
use crate::input::InputChannel;
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Prompt shown for every input-binding statement.
pub const INPUT_PROMPT: &str = "ಒಡ್ಡಿ/Enter input: ";

/// Control-flow marker threaded through statement evaluation. Return,
/// break and continue never use native control flow; they ride this enum
/// up through the enclosing statement lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Normal,
    Return(Value),
    Break,
    Continue,
}

#[derive(Debug, Clone)]
struct Function {
    params: Vec<String>,
    body: Vec<Stmt>,
}

/// Tree-walking evaluator. One instance evaluates one translation unit
/// against fresh tables; nothing survives into the next unit.
///
/// `variables` is a single flat table. A call saves it verbatim, binds the
/// parameters on top (the callee sees caller bindings it does not shadow),
/// and restores the saved table wholesale afterwards.
pub struct Evaluator<'a> {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    output: Vec<String>,
    input: &'a mut dyn InputChannel,
}

impl<'a> Evaluator<'a> {
    pub fn new(input: &'a mut dyn InputChannel) -> Self {
        Self {
            variables: HashMap::new(),
            functions: HashMap::new(),
            output: Vec::new(),
            input,
        }
    }

    /// Execute the whole program. A return signal reaching the top level is
    /// meaningless and dropped.
    pub fn run(&mut self, program: &Program) -> Result<(), KnlError> {
        self.exec_block(&program.statements)?;
        Ok(())
    }

    /// Lines the program has emitted so far, in order.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Statement lists stop at the first non-normal signal and hand it to
    /// the enclosing construct. This is what gives continue its
    /// skip-the-rest-of-the-body meaning.
    fn exec_block(&mut self, statements: &[Stmt]) -> Result<Signal, KnlError> {
        for statement in statements {
            match self.exec_statement(statement)? {
                Signal::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }

    fn exec_statement(&mut self, stmt: &Stmt) -> Result<Signal, KnlError> {
        match stmt {
            Stmt::Print { values, .. } => {
                let mut rendered = Vec::with_capacity(values.len());
                for value in values {
                    rendered.push(self.eval_expression(value)?.to_string());
                }
                self.output.push(rendered.join(" "));
                Ok(Signal::Normal)
            }
            Stmt::Assign { target, value, .. } => {
                let value = self.eval_expression(value)?;
                self.variables.insert(target.clone(), value);
                Ok(Signal::Normal)
            }
            Stmt::Input { target, span } => {
                let line = self.input.read_line(INPUT_PROMPT).map_err(|e| {
                    KnlError::runtime_error(span.clone(), format!("Input failed: {}", e))
                })?;
                self.variables.insert(target.clone(), Value::Str(line));
                Ok(Signal::Normal)
            }
            Stmt::If {
                condition,
                body,
                else_body,
                ..
            } => {
                if self.eval_expression(condition)?.is_truthy() {
                    self.exec_block(body)
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.eval_expression(condition)?.is_truthy() {
                    match self.exec_block(body)? {
                        Signal::Break => return Ok(Signal::Normal),
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                        Signal::Normal | Signal::Continue => {}
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::For {
                var,
                start,
                end,
                body,
                ..
            } => {
                // The loop variable binding persists past the loop.
                for i in *start..*end {
                    self.variables.insert(var.clone(), Value::Int(i));
                    match self.exec_block(body)? {
                        Signal::Break => return Ok(Signal::Normal),
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                        Signal::Normal | Signal::Continue => {}
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::FunctionDef {
                name, params, body, ..
            } => {
                // Registration overwrites any earlier definition and is
                // otherwise a no-op; no closure is captured.
                self.functions.insert(
                    name.clone(),
                    Function {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
                Ok(Signal::Normal)
            }
            Stmt::FunctionCall { name, args, span } => {
                self.call_function(name, args, span)?;
                Ok(Signal::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = self.eval_expression(value)?;
                Ok(Signal::Return(value))
            }
            Stmt::Break { .. } => Ok(Signal::Break),
            Stmt::Continue { .. } => Ok(Signal::Continue),
            Stmt::Pass { .. } => Ok(Signal::Normal),
            Stmt::TryExcept {
                try_body,
                except_body,
                finally_body,
                ..
            } => {
                // Any runtime failure in the try body routes to the except
                // body; the failure's details are discarded. The finally
                // body always runs, its signal is dropped, and an error
                // inside it wins.
                let outcome = match self.exec_block(try_body) {
                    Ok(signal) => Ok(signal),
                    Err(_) => self.exec_block(except_body),
                };
                if let Some(finally_body) = finally_body {
                    self.exec_block(finally_body)?;
                }
                outcome
            }
            Stmt::Import { module, .. } => {
                self.output.push(format!("Imported module: {}", module));
                Ok(Signal::Normal)
            }
            Stmt::FromImport { module, name, .. } => {
                self.output.push(format!("Imported {} from {}", name, module));
                Ok(Signal::Normal)
            }
            Stmt::ClassDef { name, .. } => {
                // Acknowledged, never executed.
                self.output.push(format!("Defined class: {}", name));
                Ok(Signal::Normal)
            }
        }
    }

    fn eval_expression(&mut self, expr: &Expr) -> Result<Value, KnlError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Int(*value)),
            Expr::Str { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Identifier { name, span } => {
                self.variables.get(name).cloned().ok_or_else(|| {
                    KnlError::runtime_error(
                        span.clone(),
                        format!("ಅಪರಿಚಿತ ಚರ/Unknown variable: {}", name),
                    )
                })
            }
            Expr::Binary {
                op, left, right, span,
            } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                self.binary_op(*op, left, right, span)
            }
            Expr::Unary { op, operand, span } => {
                let operand = self.eval_expression(operand)?;
                match (op, operand) {
                    (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(-n)),
                    (UnaryOp::Negate, Value::Double(n)) => Ok(Value::Double(-n)),
                    (UnaryOp::Negate, other) => Err(KnlError::runtime_error(
                        span.clone(),
                        format!("Cannot negate {}", other.type_name()),
                    )),
                }
            }
            Expr::Comparison {
                op, left, right, span,
            } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                self.compare(*op, left, right, span)
            }
            Expr::Call { name, args, span } => self.call_function(name, args, span),
        }
    }

    /// Call discipline: arguments evaluate left-to-right in the caller's
    /// table (extras included, then discarded); the caller's table is saved
    /// verbatim, parameters are bound on top of it, and after the body runs
    /// the saved table is restored wholesale, even when the body failed.
    fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        span: &Span,
    ) -> Result<Value, KnlError> {
        let function = self.functions.get(name).cloned().ok_or_else(|| {
            KnlError::runtime_error(
                span.clone(),
                format!("ಅಪರಿಚಿತ ಕಾರ್ಯ/Unknown function: {}", name),
            )
        })?;

        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval_expression(arg)?);
        }

        let saved = self.variables.clone();
        for (i, param) in function.params.iter().enumerate() {
            let value = evaluated.get(i).cloned().unwrap_or(Value::Unit);
            self.variables.insert(param.clone(), value);
        }

        let result = self.exec_block(&function.body);
        self.variables = saved;

        match result? {
            Signal::Return(value) => Ok(value),
            _ => Ok(Value::Unit),
        }
    }

    fn binary_op(
        &self,
        op: BinaryOp,
        left: Value,
        right: Value,
        span: &Span,
    ) -> Result<Value, KnlError> {
        match op {
            BinaryOp::Add => match (left, right) {
                (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l + r)),
                (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l + r)),
                (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 + r)),
                (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l + r as f64)),
                (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
                (l, r) => Err(KnlError::runtime_error(
                    span.clone(),
                    format!("Cannot add {} and {}", l.type_name(), r.type_name()),
                )),
            },
            BinaryOp::Subtract => match (left, right) {
                (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l - r)),
                (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l - r)),
                (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 - r)),
                (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l - r as f64)),
                (l, r) => Err(KnlError::runtime_error(
                    span.clone(),
                    format!("Cannot subtract {} and {}", l.type_name(), r.type_name()),
                )),
            },
            BinaryOp::Multiply => match (left, right) {
                (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l * r)),
                (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l * r)),
                (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 * r)),
                (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l * r as f64)),
                (l, r) => Err(KnlError::runtime_error(
                    span.clone(),
                    format!("Cannot multiply {} and {}", l.type_name(), r.type_name()),
                )),
            },
            // Division is always true division; 4/2 yields 2.0.
            BinaryOp::Divide => {
                let (l, r) = match (&left, &right) {
                    (Value::Int(l), Value::Int(r)) => (*l as f64, *r as f64),
                    (Value::Double(l), Value::Double(r)) => (*l, *r),
                    (Value::Int(l), Value::Double(r)) => (*l as f64, *r),
                    (Value::Double(l), Value::Int(r)) => (*l, *r as f64),
                    _ => {
                        return Err(KnlError::runtime_error(
                            span.clone(),
                            format!(
                                "Cannot divide {} and {}",
                                left.type_name(),
                                right.type_name()
                            ),
                        ))
                    }
                };
                if r == 0.0 {
                    return Err(KnlError::runtime_error(
                        span.clone(),
                        "Division by zero".to_string(),
                    ));
                }
                Ok(Value::Double(l / r))
            }
        }
    }

    fn compare(
        &self,
        op: CmpOp,
        left: Value,
        right: Value,
        span: &Span,
    ) -> Result<Value, KnlError> {
        // Equality never fails: mismatched types simply compare unequal.
        match op {
            CmpOp::Equal => return Ok(Value::Bool(values_equal(&left, &right))),
            CmpOp::NotEqual => return Ok(Value::Bool(!values_equal(&left, &right))),
            _ => {}
        }

        let ordering = order_values(&left, &right).ok_or_else(|| {
            KnlError::runtime_error(
                span.clone(),
                format!(
                    "Cannot compare {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            )
        })?;

        let result = match op {
            CmpOp::Less => ordering == Ordering::Less,
            CmpOp::Greater => ordering == Ordering::Greater,
            CmpOp::LessEqual => ordering != Ordering::Greater,
            CmpOp::GreaterEqual => ordering != Ordering::Less,
            CmpOp::Equal | CmpOp::NotEqual => unreachable!(),
        };
        Ok(Value::Bool(result))
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Unit, Value::Unit) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Double(l), Value::Double(r)) => l == r,
        (Value::Int(l), Value::Double(r)) => (*l as f64) == *r,
        (Value::Double(l), Value::Int(r)) => *l == (*r as f64),
        (Value::Str(l), Value::Str(r)) => l == r,
        _ => false,
    }
}

fn order_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Double(l), Value::Double(r)) => l.partial_cmp(r),
        (Value::Int(l), Value::Double(r)) => (*l as f64).partial_cmp(r),
        (Value::Double(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
