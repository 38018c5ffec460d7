//! Keystroke dispatch throughput over an in-memory document.

use core_actions::Vim;
use core_events::{KeyToken, parse_keys};
use core_model::MemoryEditor;
use core_state::VimState;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn sample_lines(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("    let value_{i} = compute(alpha, beta, {i}); // line {i}"))
        .collect()
}

fn keys(notation: &str) -> Vec<KeyToken> {
    parse_keys(notation).unwrap_or_default()
}

fn bench_keys(c: &mut Criterion, name: &str, notation: &str) {
    let lines = sample_lines(1000);
    let script = keys(notation);
    let mut vim = Vim::with_defaults().expect("engine");
    c.bench_function(name, |b| {
        b.iter_batched(
            || (MemoryEditor::from_lines("bench.rs", &lines), VimState::new("bench.rs")),
            |(mut editor, mut doc)| {
                for key in &script {
                    let _ = vim.handle_key(&mut doc, &mut editor, black_box(key.clone()));
                }
                black_box(doc.primary());
            },
            BatchSize::SmallInput,
        );
    });
}

fn movements(c: &mut Criterion) {
    bench_keys(c, "movements (hjkl w b)", "jjllhkwwwbb10j$0");
}

fn operators(c: &mut Criterion) {
    bench_keys(c, "operators (dw dd ciw yyp)", "dwddciwfoo<Esc>yypu");
}

fn multi_cursor_insert(c: &mut Criterion) {
    bench_keys(c, "visual block insert", "<C-v>9jIabc<Esc>");
}

fn macro_replay(c: &mut Criterion) {
    bench_keys(c, "macro replay (qa..q 20@a)", "qaA;<Esc>jq20@a");
}

criterion_group!(benches, movements, operators, multi_cursor_insert, macro_replay);
criterion_main!(benches);
