//! Render profiler demo
//!
//! Renders a small todo list through the profiler, records a few update
//! rounds, and prints the recording. Set `RENDER_PROFILER_ENV=production` to
//! see wrapping turn into a pass-through, and `RUST_LOG=render_profiler=info`
//! to see the per-render groups.

use anyhow::Context;
use render_profiler::{
    Component, FnComponent, IdentifierStrategy, MeasureOptions, Profiler, Wrapped,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize)]
struct TodoProps {
    id: u32,
    label: String,
    done: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SummaryProps {
    remaining: usize,
}

type TodoView = FnComponent<TodoProps, String, fn(&TodoProps) -> String>;
type SummaryView = FnComponent<SummaryProps, String, fn(&SummaryProps) -> String>;

fn render_todo(props: &TodoProps) -> String {
    let mark = if props.done { "x" } else { " " };
    format!("[{mark}] {}", props.label)
}

fn render_summary(props: &SummaryProps) -> String {
    format!("{} item(s) left", props.remaining)
}

/// Parent component owning one measured child per todo.
struct TodoList {
    items: Vec<Wrapped<TodoView>>,
    summary: Wrapped<SummaryView>,
}

impl TodoList {
    fn new(profiler: &Profiler, count: usize) -> Self {
        let items = (0..count)
            .map(|_| {
                profiler
                    .wrap(
                        IdentifierStrategy::from_prop("id"),
                        TodoView::new("TodoItem", render_todo),
                    )
                    .with_owner("TodoList")
            })
            .collect();
        let summary = profiler
            .wrap_with(
                "footer",
                SummaryView::new("Summary", render_summary),
                MeasureOptions::default().collapsed(false),
            )
            .with_owner("TodoList");
        Self { items, summary }
    }

    fn render(&mut self, todos: &[TodoProps]) -> Vec<String> {
        let mut lines: Vec<String> = self
            .items
            .iter_mut()
            .zip(todos)
            .map(|(item, props)| item.render(props))
            .collect();
        let remaining = todos.iter().filter(|todo| !todo.done).count();
        lines.push(self.summary.render(&SummaryProps { remaining }));
        lines
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let profiler = Profiler::from_env().context("failed to configure render profiler")?;
    tracing::info!(active = profiler.is_active(), "Starting render profiler demo");

    let mut todos = vec![
        TodoProps {
            id: 1,
            label: "Buy milk".to_string(),
            done: false,
        },
        TodoProps {
            id: 2,
            label: "Write report".to_string(),
            done: false,
        },
        TodoProps {
            id: 3,
            label: "Call plumber".to_string(),
            done: true,
        },
    ];

    let mut list = TodoList::new(&profiler, todos.len());
    for line in list.render(&todos) {
        println!("{line}");
    }

    profiler.start();
    for round in 0..3 {
        if round == 1 {
            todos[0].done = true;
        }
        let lines = list.render(&todos);
        tracing::debug!(round, lines = lines.len(), "rendered list");
    }
    let dump = profiler.stop();

    println!("{dump}");
    println!("{}", dump.to_json()?);
    tracing::info!(
        rows = dump.len(),
        wasted_time_ms = dump.total_wasted_time_ms(),
        "Render recording complete"
    );
    Ok(())
}
