use leadcall_agent::{CallReport, SalesPipeline};
use leadcall_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use leadcall_core::CallRecord;

use super::CommandResult;

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub query: String,
    pub json: bool,
    pub model: Option<String>,
    pub language: Option<String>,
}

pub async fn run(args: RunArgs) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides {
            llm_model: args.model.clone(),
            call_language: args.language.clone(),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("run", "config", error.to_string(), 2),
    };
    crate::init_logging(&config);

    let pipeline = match SalesPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(error) => return CommandResult::failure("run", error.kind(), error.to_string(), 2),
    };

    match pipeline.run(&args.query).await {
        Ok(report) => {
            let output = if args.json { render_json(&report) } else { render_human(&report) };
            CommandResult { exit_code: 0, output }
        }
        Err(error) => CommandResult::failure("run", error.kind(), error.to_string(), 1),
    }
}

fn render_json(report: &CallReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|error| {
        format!("{{\"error\":\"report serialization failed: {error}\"}}")
    })
}

fn render_human(report: &CallReport) -> String {
    let mut lines = vec![
        format!("call {}", report.call_id),
        format!("vendor: {} ({})", report.vendor.vendor_name, report.vendor.price_text),
        String::new(),
    ];

    for line in &report.transcript {
        lines.push(line.render());
    }

    lines.push(String::new());
    match &report.record {
        CallRecord::Parsed(record) => {
            lines.push(format!("status: {}", record.status));
            lines.push(format!("mentioned price: {}", record.mentioned_price));
            lines.push(format!("outcome: {}", record.outcome));
        }
        CallRecord::Degraded { error, raw } => {
            lines.push(format!("record degraded ({error}); raw model output:"));
            lines.push(raw.clone());
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use leadcall_core::{CallRecord, CrmRecord, PriceCandidate, TranscriptLine};
    use uuid::Uuid;

    use super::{render_human, run, RunArgs};
    use leadcall_agent::CallReport;

    fn report(record: CallRecord) -> CallReport {
        CallReport {
            call_id: Uuid::nil(),
            vendor: PriceCandidate::new("BrightDental", "12000 RUB"),
            transcript: vec![
                TranscriptLine::client("How much?"),
                TranscriptLine::admin("12000 RUB."),
            ],
            record,
        }
    }

    #[test]
    fn human_output_shows_vendor_transcript_and_record() {
        let output = render_human(&report(CallRecord::Parsed(CrmRecord {
            status: "lead".to_string(),
            mentioned_price: "12000 RUB".to_string(),
            outcome: "booked".to_string(),
        })));

        assert!(output.contains("vendor: BrightDental (12000 RUB)"));
        assert!(output.contains("👤 **CLIENT:** How much?"));
        assert!(output.contains("status: lead"));
    }

    #[test]
    fn degraded_record_is_rendered_with_its_raw_text() {
        let output = render_human(&report(CallRecord::degraded("not json")));
        assert!(output.contains("record degraded (parse failure)"));
        assert!(output.contains("not json"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_network_call() {
        // No API keys are configured in the test environment, so the
        // pipeline constructor must refuse to start the run.
        let result = run(RunArgs {
            query: "implant price".to_string(),
            json: false,
            model: None,
            language: None,
        })
        .await;

        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("credential_missing"));
    }
}
