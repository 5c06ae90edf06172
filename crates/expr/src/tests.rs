use super::*;
use types::Value::*;

fn schema(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}

fn col(name: &str) -> Expr {
    Expr::Column { name: name.into() }
}

#[test]
fn eval_literals_and_columns() {
    let row = Row::new(vec![Int(1), Text("Will".into()), Bool(true)]);
    let schema = schema(&["id", "name", "active"]);
    let ctx = EvalContext { schema: &schema };

    assert_eq!(ctx.eval(&Expr::Literal(Int(42)), &row).unwrap(), Int(42));
    assert_eq!(ctx.eval(&col("name"), &row).unwrap(), Text("Will".into()));
}

#[test]
fn eval_comparisons() {
    let row = Row::new(vec![Int(10), Int(20)]);
    let schema = schema(&["a", "b"]);
    let ctx = EvalContext { schema: &schema };

    let lt = Expr::Binary {
        left: Box::new(col("a")),
        op: BinaryOp::Lt,
        right: Box::new(col("b")),
    };
    assert_eq!(ctx.eval(&lt, &row).unwrap(), Bool(true));
}

#[test]
fn eval_arithmetic() {
    let row = Row::new(vec![Int(10), Int(3)]);
    let schema = schema(&["a", "b"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("a")),
        op: BinaryOp::Mul,
        right: Box::new(col("b")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Int(30));
}

#[test]
fn division_by_zero_is_exec_error() {
    let row = Row::new(vec![Int(10), Int(0)]);
    let schema = schema(&["a", "b"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("a")),
        op: BinaryOp::Div,
        right: Box::new(col("b")),
    };
    let err = ctx.eval(&expr, &row).unwrap_err();
    assert_eq!(err.kind(), "DivisionByZero");
}

#[test]
fn arithmetic_with_null_yields_null() {
    let row = Row::new(vec![Null, Int(3)]);
    let schema = schema(&["a", "b"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("a")),
        op: BinaryOp::Add,
        right: Box::new(col("b")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Null);
}

#[test]
fn kleene_and_short_circuits_on_false_even_with_null() {
    let row = Row::new(vec![Bool(false), Null]);
    let schema = schema(&["x", "y"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("x")),
        op: BinaryOp::And,
        right: Box::new(col("y")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Bool(false));
}

#[test]
fn kleene_or_short_circuits_on_true_even_with_null() {
    let row = Row::new(vec![Bool(true), Null]);
    let schema = schema(&["x", "y"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("x")),
        op: BinaryOp::Or,
        right: Box::new(col("y")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Bool(true));
}

#[test]
fn kleene_and_with_null_and_true_is_null() {
    let row = Row::new(vec![Bool(true), Null]);
    let schema = schema(&["x", "y"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("x")),
        op: BinaryOp::And,
        right: Box::new(col("y")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Null);
}

#[test]
fn not_operator() {
    let row = Row::new(vec![Bool(false)]);
    let schema = schema(&["f"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Unary {
        op: UnaryOp::Not,
        expr: Box::new(col("f")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Bool(true));
}

#[test]
fn not_null_is_null() {
    let row = Row::new(vec![Null]);
    let schema = schema(&["f"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Unary {
        op: UnaryOp::Not,
        expr: Box::new(col("f")),
    };
    assert_eq!(ctx.eval(&expr, &row).unwrap(), Null);
}

#[test]
fn mismatched_types_fail() {
    let row = Row::new(vec![Int(1), Text("hi".into())]);
    let schema = schema(&["a", "b"]);
    let ctx = EvalContext { schema: &schema };

    let expr = Expr::Binary {
        left: Box::new(col("a")),
        op: BinaryOp::Eq,
        right: Box::new(col("b")),
    };

    let err = ctx.eval(&expr, &row).unwrap_err();
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn unknown_column_errors() {
    let row = Row::new(vec![Int(1)]);
    let schema = schema(&["a"]);
    let ctx = EvalContext { schema: &schema };

    let err = ctx.eval(&col("missing"), &row).unwrap_err();
    assert_eq!(err.kind(), "UnknownColumn");
}
