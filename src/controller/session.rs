//! Line-driven session over a slider page.
//!
//! Each prediction runs as its own task; answers come back in whatever
//! order they finish and go through the page's sequence guard. When input
//! ends, the session waits for every dispatched prediction before returning.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use super::{Applied, ComparisonController, DemoController, PendingPrediction, SliderPage, Ticket};
use crate::api::DashboardApi;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::model::ModelId;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set(String, f64),
    Model(ModelId),
    Show,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match head {
        "quit" | "exit" => Ok(Some(Command::Quit)),
        "show" => Ok(Some(Command::Show)),
        "model" => rest.parse().map(|m| Some(Command::Model(m))),
        "set" => {
            // feature names contain spaces; the value is the last token
            let (feature, value) = rest
                .rsplit_once(' ')
                .ok_or_else(|| "usage: set <feature> <value>".to_string())?;
            let value = value
                .parse::<f64>()
                .map_err(|e| format!("bad value '{}': {}", value, e))?;
            Ok(Some(Command::Set(feature.trim().to_string(), value)))
        }
        other => Err(format!("unknown command '{}'", other)),
    }
}

/// Slider pages a session can drive.
pub trait InteractivePage: SliderPage {
    fn choose_model(&mut self, model: ModelId) -> Result<Option<PendingPrediction>, String>;
}

impl InteractivePage for DemoController {
    fn choose_model(&mut self, model: ModelId) -> Result<Option<PendingPrediction>, String> {
        Ok(self.select_model(model))
    }
}

impl InteractivePage for ComparisonController {
    fn choose_model(&mut self, _model: ModelId) -> Result<Option<PendingPrediction>, String> {
        Err("the comparison page always shows every model".to_string())
    }
}

/// Counts for one finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub dispatched: usize,
    pub applied: usize,
    pub stale: usize,
}

impl SessionSummary {
    fn record(&mut self, applied: Applied) {
        match applied {
            Applied::Stale => self.stale += 1,
            Applied::Fresh | Applied::Failed => self.applied += 1,
        }
    }
}

fn dispatch<A>(api: &Arc<A>, tx: &mpsc::UnboundedSender<Ticket>, pending: PendingPrediction)
where
    A: DashboardApi + 'static,
{
    let api = Arc::clone(api);
    let tx = tx.clone();
    tokio::spawn(async move {
        let ticket = pending.send(api.as_ref()).await;
        let _ = tx.send(ticket);
    });
}

/// Read commands until `quit` or end of input. `show` is called for the
/// `show` command and after every applied prediction.
pub async fn run_session<P, A, R, F>(
    page: &mut P,
    api: Arc<A>,
    input: R,
    mut show: F,
) -> std::io::Result<SessionSummary>
where
    P: InteractivePage,
    A: DashboardApi + 'static,
    R: AsyncBufRead + Unpin,
    F: FnMut(&P),
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Ticket>();
    let mut lines = input.lines();
    let mut summary = SessionSummary::default();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let pending = match parse_command(&line) {
                    Ok(None) => continue,
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Show)) => {
                        show(&*page);
                        continue;
                    }
                    Ok(Some(Command::Set(feature, value))) => {
                        page.set_feature(&feature, value).map_err(|e| e.to_string())
                    }
                    Ok(Some(Command::Model(model))) => match page.choose_model(model) {
                        Ok(Some(pending)) => Ok(pending),
                        Ok(None) => continue,
                        Err(msg) => Err(msg),
                    },
                    Err(msg) => Err(msg),
                };
                match pending {
                    Ok(pending) => {
                        summary.dispatched += 1;
                        dispatch(&api, &tx, pending);
                    }
                    Err(msg) => eprintln!("{}", msg),
                }
            }
            Some(ticket) = rx.recv() => {
                let applied = page.apply(ticket);
                summary.record(applied);
                if applied != Applied::Stale {
                    show(&*page);
                }
            }
        }
    }

    // in-flight predictions still land before the page is handed back
    drop(tx);
    while let Some(ticket) = rx.recv().await {
        summary.record(page.apply(ticket));
    }
    log(
        Level::Info,
        Domain::Controller,
        "session_end",
        obj(&[
            ("page", v_str(page.page_name())),
            ("dispatched", v_num(summary.dispatched as f64)),
            ("applied", v_num(summary.applied as f64)),
            ("stale", v_num(summary.stale as f64)),
        ]),
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::fake::FakeApi;
    use std::sync::atomic::Ordering;

    #[test]
    fn set_keeps_spaces_in_feature_name() {
        assert_eq!(
            parse_command("set worst concave points 0.12"),
            Ok(Some(Command::Set("worst concave points".into(), 0.12)))
        );
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("exit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert!(parse_command("set worst area").is_err());
        assert!(parse_command("set worst area lots").is_err());
        assert!(parse_command("model svm").is_err());
        assert!(parse_command("predict").is_err());
        assert_eq!(
            parse_command("model random_forest"),
            Ok(Some(Command::Model(ModelId::RandomForest)))
        );
    }

    #[tokio::test]
    async fn predictions_in_flight_at_end_of_input_are_applied() {
        let api = Arc::new(FakeApi::default());
        let mut page = DemoController::new();
        page.mount(api.as_ref()).await;
        assert_eq!(page.prediction().unwrap().prediction, 1);

        let input: &[u8] = b"set worst area 4000\n";
        let summary = run_session(&mut page, Arc::clone(&api), input, |_| {}).await.unwrap();

        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.applied, 1);
        assert_eq!(api.predict_calls.load(Ordering::SeqCst), 2);
        assert_eq!(page.values().get("worst area"), Some(4000.0));
        assert_eq!(page.prediction().unwrap().prediction, 0);
    }

    #[tokio::test]
    async fn quit_waits_for_model_switch() {
        let api = Arc::new(FakeApi::default());
        let mut page = DemoController::new();
        page.mount(api.as_ref()).await;

        let input: &[u8] =
            b"model gradient_boosting\nmodel gradient_boosting\nquit\nset worst area 1\n";
        let summary = run_session(&mut page, Arc::clone(&api), input, |_| {}).await.unwrap();

        // second selection of the same model issues nothing; lines after quit are ignored
        assert_eq!(summary.dispatched, 1);
        assert_eq!(page.model(), ModelId::GradientBoosting);
        assert_eq!(*api.last_model.lock().unwrap(), Some(ModelId::GradientBoosting));
        assert_eq!(page.values().get("worst area"), Some(880.6));
    }

    #[tokio::test]
    async fn comparison_session_rejects_model_and_shows_on_request() {
        let api = Arc::new(FakeApi::default());
        let mut page = ComparisonController::new();
        page.mount(api.as_ref()).await;

        let mut shown = 0;
        let input: &[u8] = b"model random_forest\nshow\nbogus\n";
        let summary =
            run_session(&mut page, Arc::clone(&api), input, |_| shown += 1).await.unwrap();

        assert_eq!(summary.dispatched, 0);
        assert!(shown >= 1);
        assert_eq!(api.predict_all_calls.load(Ordering::SeqCst), 1);
    }
}
