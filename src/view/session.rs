//! Selector session: turns selector changes into recomputations.
//!
//! Selector state lives in a `watch` channel, so the render loop always sees
//! the most recent pair and never works through a backlog of stale ones.

use crate::models::{
    ChartDescription, FieldRole, GroupField, InvalidFieldError, InvalidFieldReason, MeasureField,
    SelectorPair,
};
use crate::view::aggregation::AggregationView;
use tokio::sync::watch;
use tracing::debug;

/// Owner of the current selector pair.
pub struct SelectorSession {
    view: AggregationView,
    tx: watch::Sender<SelectorPair>,
}

impl SelectorSession {
    /// Start a session at `initial`.
    pub fn new(view: AggregationView, initial: SelectorPair) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { view, tx }
    }

    /// Subscribe a render loop to selector changes.
    pub fn subscribe(&self) -> watch::Receiver<SelectorPair> {
        self.tx.subscribe()
    }

    /// The pair currently selected.
    pub fn current(&self) -> SelectorPair {
        *self.tx.borrow()
    }

    /// Change the group-by selector. Returns `Ok(false)` when the value is
    /// already selected.
    pub fn set_group(&self, name: &str) -> Result<bool, InvalidFieldError> {
        let group: GroupField = name.parse()?;
        self.ensure_in_table(group.as_str(), FieldRole::Group)?;

        Ok(self.tx.send_if_modified(|pair| {
            if pair.group == group {
                false
            } else {
                pair.group = group;
                true
            }
        }))
    }

    /// Change the x-axis selector. Returns `Ok(false)` when the value is
    /// already selected.
    pub fn set_measure(&self, name: &str) -> Result<bool, InvalidFieldError> {
        let measure: MeasureField = name.parse()?;
        self.ensure_in_table(measure.as_str(), FieldRole::Measure)?;

        Ok(self.tx.send_if_modified(|pair| {
            if pair.measure == measure {
                false
            } else {
                pair.measure = measure;
                true
            }
        }))
    }

    /// Ask subscribers to render the current pair again.
    pub fn refresh(&self) {
        self.tx.send_modify(|_| {});
    }

    /// A render loop bound to this session's view.
    pub fn render_loop<F>(&self, on_render: F) -> impl std::future::Future<Output = usize>
    where
        F: FnMut(SelectorPair, Result<ChartDescription, InvalidFieldError>),
    {
        run_render_loop(self.view.clone(), self.subscribe(), on_render)
    }

    fn ensure_in_table(&self, field: &str, role: FieldRole) -> Result<(), InvalidFieldError> {
        if self.view.table().has_field(field) {
            Ok(())
        } else {
            Err(InvalidFieldError {
                field: field.to_string(),
                role,
                reason: InvalidFieldReason::NotInSchema,
            })
        }
    }
}

/// Render the current pair once, then once per observed change until every
/// sender is dropped. Returns the number of renders.
pub async fn run_render_loop<F>(
    view: AggregationView,
    mut rx: watch::Receiver<SelectorPair>,
    mut on_render: F,
) -> usize
where
    F: FnMut(SelectorPair, Result<ChartDescription, InvalidFieldError>),
{
    let mut renders = 0;

    loop {
        let pair = *rx.borrow_and_update();
        debug!("Rendering {} x {}", pair.group, pair.measure);
        on_render(pair, view.render(pair));
        renders += 1;

        if rx.changed().await.is_err() {
            break;
        }
    }

    renders
}

/// A line of input in interactive mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// `group <field>`
    Group(String),
    /// `x <field>`
    Measure(String),
    /// Re-render the current selection.
    Show,
    /// List selector options.
    Options,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();

        if parts.next().is_some() {
            return Err(format!("too many arguments to '{}'", verb));
        }

        let command = match (verb.to_lowercase().as_str(), arg) {
            ("group" | "group-by" | "color", Some(field)) => {
                SessionCommand::Group(field.to_string())
            }
            ("x" | "x-axis", Some(field)) => SessionCommand::Measure(field.to_string()),
            ("group" | "group-by" | "color" | "x" | "x-axis", None) => {
                return Err(format!("'{}' needs a field name", verb));
            }
            ("show", None) => SessionCommand::Show,
            ("options", None) => SessionCommand::Options,
            ("help" | "?", None) => SessionCommand::Help,
            ("quit" | "exit" | "q", None) => SessionCommand::Quit,
            (other, _) => return Err(format!("unknown command '{}'", other)),
        };

        Ok(Some(command))
    }
}

/// Help text for interactive mode.
pub fn help_text() -> String {
    [
        "Commands:",
        "  group <field>   set the group-by selector",
        "  x <field>       set the x-axis selector",
        "  show            render the current selection again",
        "  options         list selector options",
        "  quit            leave the session",
    ]
    .join("\n")
}
