//! Compares symbolic, forward-mode and reverse-mode gradients on a few
//! formulas, and shows how large unsimplified symbolic derivatives get.
//!
//! Run with: `cargo run --example gradient_modes`

use exprdiff::expr::{
    add, cos, div, exp, mul, node_count, one, power, sin, sub, variable, variables,
};
use exprdiff::{
    backward_all_diff, differentiate, forward_gradient, symbolic_gradient, Environment, Expr,
};
use tracing_subscriber::EnvFilter;

fn compare(name: &str, e: &Expr, env: &Environment) -> exprdiff::Result<()> {
    println!("{name}: {e}");
    let symbolic = symbolic_gradient(env, e)?;
    let forward = forward_gradient(env, e)?;
    let reverse = backward_all_diff(env, e)?;

    for var in variables(e) {
        let s = symbolic.get(var).unwrap_or(f64::NAN);
        let f = forward.get(var).unwrap_or(f64::NAN);
        let r = reverse.get(var).unwrap_or(f64::NAN);
        println!("  ∂/∂x{var}: symbolic={s:.9} forward={f:.9} reverse={r:.9}");
    }
    println!();
    Ok(())
}

fn main() -> exprdiff::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (x, y) = (variable(0), variable(1));
    let env = Environment::from([(0, 1.0), (1, 1.0)]);

    println!("=== Gradient modes ===\n");

    let sigmoid = div(
        one(),
        add(one(), exp(add(mul(x.clone(), y.clone()), sin(x.clone())))),
    );
    compare("sigmoid", &sigmoid, &env)?;

    let poly = sub(power(3, x.clone()), mul(y.clone(), cos(y.clone())));
    compare("poly", &poly, &env)?;

    let repeated = add(mul(x.clone(), x.clone()), x.clone());
    compare("repeated", &repeated, &Environment::singleton(0, 5.0))?;

    println!("=== Expression swell ===\n");
    let mut e = sigmoid;
    for order in 1..=4 {
        e = differentiate(0, &e)?;
        println!("  order {order}: {} nodes", node_count(&e));
    }
    Ok(())
}
