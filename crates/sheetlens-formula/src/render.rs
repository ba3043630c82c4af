//! Postfix-to-infix formula rendering
//!
//! Converts a token stream in RPN order into the display text used by the
//! annotated export: cell references render as `[.A1]`, areas as
//! `[.A1:.B2]` (whole-column areas as the bare `B:D` form), and function
//! arguments are joined with `;`.

use crate::error::{FormulaError, FormulaResult};
use crate::token::{Attr, Token};
use sheetlens_core::CellRange;

/// Render a postfix token stream to a human-readable infix string
///
/// Fails with [`FormulaError::Malformed`] if the stream is empty, an
/// operator finds fewer operands than its arity, or more than one value
/// remains on the stack at the end.
pub fn render_tokens(tokens: &[Token]) -> FormulaResult<String> {
    if tokens.is_empty() {
        return Err(FormulaError::Malformed("empty token stream".into()));
    }

    let mut stack: Vec<String> = Vec::new();

    for token in tokens {
        match token {
            // Starts a list of area expressions combined by trailing
            // operators; nothing to do here.
            Token::List => {}

            Token::Paren => {
                let inner = pop_operands(&mut stack, 1)?;
                stack.push(format!("({})", inner[0]));
            }

            // These precede the operand they annotate, which is against
            // the RPN ordering assumed here, so they are dropped.
            Token::Attr(Attr::Skip) | Token::Attr(Attr::Space) | Token::Attr(Attr::Volatile) => {}

            Token::Attr(Attr::Sum(n)) => {
                let args = pop_operands(&mut stack, *n as usize)?;
                stack.push(format!("SUM({})", args.join(";")));
            }

            Token::CellRef(addr) => {
                stack.push(format!("[.{}]", addr.to_a1_string()));
            }

            Token::AreaRef(range) => {
                stack.push(render_area(range));
            }

            Token::Literal(text) => {
                stack.push(text.clone());
            }

            Token::Op(op) => {
                let args = pop_operands(&mut stack, op.arity())?;
                stack.push(op.render(&args));
            }

            Token::Func {
                name,
                argc,
                external,
            } => {
                let args = pop_operands(&mut stack, *argc as usize)?;
                stack.push(if *external {
                    // The earliest-pushed operand is the call-target name
                    format!("{}({})", args[0], args[1..].join(";"))
                } else {
                    format!("{}({})", name, args.join(";"))
                });
            }
        }
    }

    let result = stack
        .pop()
        .ok_or_else(|| FormulaError::Malformed("nothing left on the stack".into()))?;
    if !stack.is_empty() {
        return Err(FormulaError::Malformed(format!(
            "{} extra value(s) left on the stack",
            stack.len()
        )));
    }
    Ok(result)
}

fn render_area(range: &CellRange) -> String {
    if range.is_whole_columns() {
        range.to_column_range_string()
    } else {
        format!(
            "[.{}:.{}]",
            range.start.to_a1_string(),
            range.end.to_a1_string()
        )
    }
}

/// Pop `n` operands, restoring original push order
///
/// The returned slot 0 holds the operand pushed earliest among the `n`
/// consumed; the stack's LIFO order would otherwise silently reverse
/// function arguments.
fn pop_operands(stack: &mut Vec<String>, n: usize) -> FormulaResult<Vec<String>> {
    if stack.len() < n {
        return Err(FormulaError::Malformed(format!(
            "operation expected {} operand(s) but got {}",
            n,
            stack.len()
        )));
    }
    Ok(stack.split_off(stack.len() - n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{BinaryOp, Op};
    use pretty_assertions::assert_eq;
    use sheetlens_core::{CellAddress, CellRange, MAX_ROWS};

    #[test]
    fn test_empty_stream_is_malformed() {
        assert!(matches!(
            render_tokens(&[]),
            Err(FormulaError::Malformed(_))
        ));
    }

    #[test]
    fn test_single_cell_ref() {
        let out = render_tokens(&[Token::cell(0, 0)]).unwrap();
        assert_eq!(out, "[.A1]");
    }

    #[test]
    fn test_absolute_sigils_preserved() {
        let addr = CellAddress::with_absolute(1, 1, true, true);
        let out = render_tokens(&[Token::CellRef(addr)]).unwrap();
        assert_eq!(out, "[.$B$2]");
    }

    #[test]
    fn test_argument_order_preserved() {
        // A pushed first, B second: subtraction must render A-B, not B-A
        let tokens = [
            Token::cell(0, 0),
            Token::cell(0, 1),
            Token::Op(Op::Binary(BinaryOp::Subtract)),
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "[.A1]-[.B1]");
    }

    #[test]
    fn test_function_argument_order() {
        let tokens = [
            Token::lit("1"),
            Token::lit("2"),
            Token::lit("3"),
            Token::Func {
                name: "IF".into(),
                argc: 3,
                external: false,
            },
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "IF(1;2;3)");
    }

    #[test]
    fn test_external_function_naming() {
        // CALL("MYFUNC"; X; Y): the name travels as the first operand
        let tokens = [
            Token::lit("MYFUNC"),
            Token::lit("X"),
            Token::lit("Y"),
            Token::Func {
                name: "CALL".into(),
                argc: 3,
                external: true,
            },
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "MYFUNC(X;Y)");
    }

    #[test]
    fn test_paren_marker_wraps_last_operand() {
        let tokens = [
            Token::lit("1"),
            Token::lit("2"),
            Token::Op(Op::Binary(BinaryOp::Add)),
            Token::Paren,
            Token::lit("3"),
            Token::Op(Op::Binary(BinaryOp::Multiply)),
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "(1+2)*3");
    }

    #[test]
    fn test_attr_sum() {
        let tokens = [Token::area(0, 0, 2, 0), Token::Attr(Attr::Sum(1))];
        assert_eq!(render_tokens(&tokens).unwrap(), "SUM([.A1:.A3])");
    }

    #[test]
    fn test_non_operand_attrs_dropped() {
        let tokens = [
            Token::Attr(Attr::Volatile),
            Token::List,
            Token::lit("1"),
            Token::Attr(Attr::Space),
            Token::lit("2"),
            Token::Op(Op::Binary(BinaryOp::Add)),
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "1+2");
    }

    #[test]
    fn test_area_whole_column_form() {
        // B:D spanning every row renders as the column-range label, not
        // the bracketed per-cell form
        let range = CellRange::from_indices(0, 1, MAX_ROWS - 1, 3);
        let out = render_tokens(&[Token::AreaRef(range)]).unwrap();
        assert_eq!(out, "B:D");
    }

    #[test]
    fn test_area_partial_form() {
        let out = render_tokens(&[Token::area(0, 1, 9, 3)]).unwrap();
        assert_eq!(out, "[.B1:.D10]");
    }

    #[test]
    fn test_stack_underflow() {
        let tokens = [Token::lit("1"), Token::Op(Op::Binary(BinaryOp::Add))];
        assert!(matches!(
            render_tokens(&tokens),
            Err(FormulaError::Malformed(_))
        ));
    }

    #[test]
    fn test_leftover_operands() {
        let tokens = [Token::lit("1"), Token::lit("2")];
        assert!(matches!(
            render_tokens(&tokens),
            Err(FormulaError::Malformed(_))
        ));
    }

    #[test]
    fn test_unary_and_percent() {
        let tokens = [
            Token::lit("5"),
            Token::Op(Op::Neg),
            Token::lit("50"),
            Token::Op(Op::Percent),
            Token::Op(Op::Binary(BinaryOp::Multiply)),
        ];
        assert_eq!(render_tokens(&tokens).unwrap(), "-5*50%");
    }
}
