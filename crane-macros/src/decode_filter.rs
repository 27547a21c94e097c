use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{BinOp, Expr, ExprLit, ExprPath, ExprRange, LitStr, RangeLimits, UnOp, spanned::Spanned};

/// `Type::field`, a column reference emitted by `#[derive(Entity)]`.
fn is_column(path: &ExprPath) -> bool {
    let segments = &path.path.segments;
    path.qself.is_none()
        && segments.len() >= 2
        && segments
            .iter()
            .rev()
            .nth(1)
            .is_some_and(|v| v.ident.to_string().starts_with(|c: char| c.is_ascii_uppercase()))
        && segments
            .last()
            .is_some_and(|v| !v.ident.to_string().starts_with(|c: char| c.is_ascii_uppercase()))
}

fn is_none(path: &ExprPath) -> bool {
    path.path.segments.iter().map(|v| &v.ident).eq(["None"].iter())
}

/// Whether `expr` mentions a column anywhere, otherwise it is evaluated as a whole.
fn has_column(expr: &Expr) -> bool {
    match expr {
        Expr::Path(v) => is_column(v),
        Expr::Binary(v) => has_column(&v.left) || has_column(&v.right),
        Expr::Unary(v) => has_column(&v.expr),
        Expr::Paren(v) => has_column(&v.expr),
        Expr::Group(v) => has_column(&v.expr),
        Expr::Reference(v) => has_column(&v.expr),
        Expr::MethodCall(v) => has_column(&v.receiver) || v.args.iter().any(has_column),
        Expr::Array(v) => v.elems.iter().any(has_column),
        Expr::Range(v) => {
            v.start.as_deref().is_some_and(has_column) || v.end.as_deref().is_some_and(has_column)
        }
        _ => false,
    }
}

fn value(expr: &Expr) -> TokenStream {
    quote! { ::crane::Predicate::value(::std::clone::Clone::clone(&(#expr))) }
}

fn range(v: &ExprRange) -> TokenStream {
    let bound = |v: Option<&Expr>| match v {
        Some(v) => {
            let v = decode_filter(v);
            quote!(Some(Box::new(#v)))
        }
        None => quote!(None),
    };
    let start = bound(v.start.as_deref());
    let end = bound(v.end.as_deref());
    let inclusive = matches!(v.limits, RangeLimits::Closed(..));
    quote! {
        ::crane::Predicate::Range {
            start: #start,
            end: #end,
            inclusive: #inclusive,
        }
    }
}

pub fn decode_filter(expr: &Expr) -> TokenStream {
    match expr {
        Expr::Paren(v) => decode_filter(&v.expr),
        Expr::Group(v) => decode_filter(&v.expr),
        Expr::Reference(v) => decode_filter(&v.expr),
        Expr::Lit(ExprLit { lit, .. }) => quote! { ::crane::Predicate::value(#lit) },
        Expr::Path(v) if is_column(v) => {
            let path = &v.path;
            quote! { ::crane::Predicate::column(#path) }
        }
        Expr::Path(v) if is_none(v) => quote! { ::crane::Predicate::Value(::crane::Value::Null) },
        Expr::Array(v) => {
            let elems = v.elems.iter().map(decode_filter);
            quote! { ::crane::Predicate::List(vec![#(#elems),*]) }
        }
        Expr::Range(v) => range(v),
        Expr::Binary(v) if has_column(expr) => {
            let op = match v.op {
                BinOp::Add(..) => quote! { ::crane::BinaryOpType::Addition },
                BinOp::Sub(..) => quote! { ::crane::BinaryOpType::Subtraction },
                BinOp::Mul(..) => quote! { ::crane::BinaryOpType::Multiplication },
                BinOp::Div(..) => quote! { ::crane::BinaryOpType::Division },
                BinOp::Rem(..) => quote! { ::crane::BinaryOpType::Remainder },
                BinOp::And(..) => quote! { ::crane::BinaryOpType::And },
                BinOp::Or(..) => quote! { ::crane::BinaryOpType::Or },
                BinOp::BitAnd(..) => quote! { ::crane::BinaryOpType::BitwiseAnd },
                BinOp::BitOr(..) => quote! { ::crane::BinaryOpType::BitwiseOr },
                BinOp::BitXor(..) => quote! { ::crane::BinaryOpType::BitwiseXor },
                BinOp::Shl(..) => quote! { ::crane::BinaryOpType::ShiftLeft },
                BinOp::Shr(..) => quote! { ::crane::BinaryOpType::ShiftRight },
                BinOp::Eq(..) => quote! { ::crane::BinaryOpType::Equal },
                BinOp::Ne(..) => quote! { ::crane::BinaryOpType::NotEqual },
                BinOp::Lt(..) => quote! { ::crane::BinaryOpType::Less },
                BinOp::Le(..) => quote! { ::crane::BinaryOpType::LessEqual },
                BinOp::Gt(..) => quote! { ::crane::BinaryOpType::Greater },
                BinOp::Ge(..) => quote! { ::crane::BinaryOpType::GreaterEqual },
                _ => {
                    return syn::Error::new(
                        v.op.span(),
                        format!("Unsupported operator `{}` in a filter", v.op.to_token_stream()),
                    )
                    .to_compile_error();
                }
            };
            let lhs = decode_filter(&v.left);
            let rhs = decode_filter(&v.right);
            quote! { ::crane::Predicate::binary(#lhs, #op, #rhs) }
        }
        Expr::Unary(v) if has_column(expr) => {
            let op = match v.op {
                UnOp::Not(..) => quote! { ::crane::UnaryOpType::Not },
                UnOp::Neg(..) => quote! { ::crane::UnaryOpType::Negative },
                _ => {
                    return syn::Error::new(
                        v.op.span(),
                        format!("Unsupported operator `{}` in a filter", v.op.to_token_stream()),
                    )
                    .to_compile_error();
                }
            };
            let arg = decode_filter(&v.expr);
            quote! {
                ::crane::Predicate::Unary {
                    op: #op,
                    arg: Box::new(#arg),
                }
            }
        }
        Expr::MethodCall(v)
            if has_column(expr)
                || matches!(
                    strip(&v.receiver),
                    Expr::Array(..) | Expr::Range(..)
                ) =>
        {
            let receiver = decode_filter(&v.receiver);
            let method = LitStr::new(&v.method.to_string(), v.method.span());
            let args = v.args.iter().map(decode_filter);
            quote! { ::crane::Predicate::call(#receiver, #method, vec![#(#args),*]) }
        }
        _ => value(expr),
    }
}

/// Expression without the parentheses and references around it.
fn strip(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(v) => strip(&v.expr),
        Expr::Group(v) => strip(&v.expr),
        Expr::Reference(v) => strip(&v.expr),
        _ => expr,
    }
}
