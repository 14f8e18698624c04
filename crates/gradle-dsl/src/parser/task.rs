//! Task declarations: `task name`, `tasks.register(..)`, `tasks.create(..)`.

use super::block::{Block, CallChain, Expr, Invocation, Statement};
use crate::types::Task;

/// Strips Kotlin class literal suffixes: `Copy::class.java` becomes `Copy`.
fn type_name(src: &str, expr: &Expr) -> String {
    let text = expr.scalar(src).unwrap_or_else(|| expr.text(src));
    text.trim_end_matches(".java")
        .trim_end_matches("::class")
        .trim()
        .to_string()
}

fn closure_value(src: &str, block: &Block, key: &str) -> String {
    block
        .statements
        .iter()
        .rev()
        .find_map(|stmt| match stmt {
            Statement::Assign(a) if a.target == key => a.value.scalar(src).map(str::to_string),
            Statement::Call(c) if c.head.name == key && c.tail.is_empty() => c
                .head
                .first_arg()
                .and_then(|e| e.scalar(src))
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_default()
}

fn build(src: &str, name: String, task_type: String, closure: Option<&Block>) -> Task {
    let (configuration, description, group) = closure.map_or_else(Default::default, |block| {
        (
            block.body(src).trim().to_string(),
            closure_value(src, block, "description"),
            closure_value(src, block, "group"),
        )
    });
    Task {
        name,
        task_type,
        configuration,
        description,
        group,
    }
}

/// `task foo`, `task foo(type: T) { }`, `task('foo')`, `task<T>("foo")`.
fn legacy_task(src: &str, chain: &CallChain) -> Option<Task> {
    let head = &chain.head;
    let first = head.positional().next()?;
    let explicit_type = head.named("type").map(|a| type_name(src, &a.value));

    match &first.value {
        Expr::Call(inv) => {
            let task_type = inv
                .named("type")
                .map(|a| type_name(src, &a.value))
                .or(explicit_type)
                .or_else(|| head.type_args.clone())
                .unwrap_or_default();
            let closure = inv.closure.as_ref().or_else(|| chain.closure());
            Some(build(src, inv.name.clone(), task_type, closure))
        }
        value => {
            let name = value.scalar(src)?.to_string();
            let task_type = explicit_type
                .or_else(|| head.type_args.clone())
                .unwrap_or_default();
            Some(build(src, name, task_type, chain.closure()))
        }
    }
}

/// `register("foo", Copy::class) { }` or `register<Copy>("foo")`.
fn registered_task(src: &str, inv: &Invocation, chain: &CallChain) -> Option<Task> {
    let mut positional = inv.positional();
    let name = positional.next()?.value.scalar(src)?.to_string();
    let task_type = positional
        .next()
        .map(|a| type_name(src, &a.value))
        .or_else(|| inv.named("type").map(|a| type_name(src, &a.value)))
        .or_else(|| inv.type_args.clone())
        .unwrap_or_default();
    let closure = inv.closure.as_ref().or_else(|| chain.closure());
    Some(build(src, name, task_type, closure))
}

/// Parses a top-level task declaration.
pub fn parse_task(src: &str, chain: &CallChain) -> Option<Task> {
    match chain.head.name.as_str() {
        "task" => legacy_task(src, chain),
        "tasks.register" | "tasks.create" => registered_task(src, &chain.head, chain),
        _ => None,
    }
}

/// Parses a statement inside a `tasks { }` block.
pub fn parse_tasks_member(src: &str, chain: &CallChain) -> Option<Task> {
    match chain.head.name.as_str() {
        "register" | "create" => registered_task(src, &chain.head, chain),
        _ => parse_task(src, chain),
    }
}
