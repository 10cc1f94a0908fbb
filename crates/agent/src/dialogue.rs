//! Six-turn negotiation call simulation.
//!
//! One model plays both sides of the call with asymmetric context. The admin
//! persona sees the full accumulating shared history; the client persona is
//! rebuilt from scratch every turn and only ever sees its own framing plus an
//! instruction (turn 3's instruction embeds the admin's previous line
//! verbatim). A completion failure on any turn discards the partial
//! transcript: downstream extraction is only defined over a complete call.

use std::sync::Arc;

use tracing::{error, info};

use leadcall_core::config::CallConfig;
use leadcall_core::{
    strip_role_prefix, Message, PipelineError, PriceCandidate, Speaker, Stage, TranscriptLine,
};

use crate::llm::CompletionClient;

/// Number of turns in every simulated call, client first, strictly
/// alternating.
pub const TURN_COUNT: usize = 6;

pub struct DialogueEngine {
    llm: Arc<dyn CompletionClient>,
    language: String,
}

impl DialogueEngine {
    pub fn new(llm: Arc<dyn CompletionClient>, call: &CallConfig) -> Self {
        Self { llm, language: call.language.clone() }
    }

    /// Drives the fixed six-turn call and returns the ordered transcript.
    /// Either all six turns complete or the whole call fails.
    pub async fn run(&self, candidate: &PriceCandidate) -> Result<Vec<TranscriptLine>, PipelineError> {
        let admin_system = Message::system(admin_persona(candidate, &self.language));
        let client_system = Message::system(client_persona(candidate, &self.language));

        let mut shared_history = vec![admin_system];
        let mut transcript = Vec::with_capacity(TURN_COUNT);

        // Turn 1: client opens the call.
        let turn1 = self.client_turn(&client_system, OPENING_INSTRUCTION, 1).await?;
        transcript.push(TranscriptLine::client(turn1.clone()));
        shared_history.push(Message::client(with_prefix(Speaker::Client, &turn1)));

        // Turn 2: admin answers over the shared history.
        let turn2 = self.admin_turn(&shared_history, 2).await?;
        transcript.push(TranscriptLine::admin(turn2.clone()));
        shared_history.push(Message::admin(with_prefix(Speaker::Admin, &turn2)));

        // Turn 3: client pushes back, quoting the admin's line verbatim.
        let probe = format!("The admin said: '{turn2}'. Ask why it is so cheap.");
        let turn3 = self.client_turn(&client_system, &probe, 3).await?;
        transcript.push(TranscriptLine::client(turn3.clone()));
        shared_history.push(Message::client(with_prefix(Speaker::Client, &turn3)));

        // Turn 4: admin defends the price.
        let turn4 = self.admin_turn(&shared_history, 4).await?;
        transcript.push(TranscriptLine::admin(turn4.clone()));
        shared_history.push(Message::admin(with_prefix(Speaker::Admin, &turn4)));

        // Turn 5: client commits. The line is not appended to the shared
        // history; turn 6 receives it alongside instead.
        let turn5 = self.client_turn(&client_system, CLOSING_INSTRUCTION, 5).await?;
        transcript.push(TranscriptLine::client(turn5.clone()));

        // Turn 6: admin closes over the history plus the unshared turn-5 line.
        let mut closing_view = shared_history.clone();
        closing_view.push(Message::client(with_prefix(Speaker::Client, &turn5)));
        let turn6 = self.admin_turn(&closing_view, 6).await?;
        transcript.push(TranscriptLine::admin(turn6));

        info!(event_name = "dialogue.call.completed", turns = transcript.len(), "call simulation finished");
        Ok(transcript)
    }

    async fn client_turn(
        &self,
        client_system: &Message,
        instruction: &str,
        turn: usize,
    ) -> Result<String, PipelineError> {
        let view = [client_system.clone(), Message::client(instruction)];
        self.take_turn(&view, Speaker::Client, turn).await
    }

    async fn admin_turn(&self, history: &[Message], turn: usize) -> Result<String, PipelineError> {
        self.take_turn(history, Speaker::Admin, turn).await
    }

    async fn take_turn(
        &self,
        view: &[Message],
        speaker: Speaker,
        turn: usize,
    ) -> Result<String, PipelineError> {
        let response = self.llm.complete(view).await.map_err(|provider_error| {
            error!(
                event_name = "dialogue.turn.failed",
                turn,
                speaker = speaker.label(),
                error = %provider_error,
                "aborting call; partial transcript discarded"
            );
            PipelineError::provider(Stage::Dialogue, provider_error.to_string())
        })?;

        let text = strip_role_prefix(&response.into_text(), speaker.wire_prefix());
        info!(event_name = "dialogue.turn.completed", turn, speaker = speaker.label(), "turn captured");
        Ok(text)
    }
}

const OPENING_INSTRUCTION: &str = "Start the call. Ask about the price.";
const CLOSING_INSTRUCTION: &str = "Say: 'Alright, book me in for tomorrow'.";

fn admin_persona(candidate: &PriceCandidate, language: &str) -> String {
    format!(
        "You are the ADMIN at '{}'. The advertised price is {}. \
         Your goal: book the caller for an appointment. \
         Answer in {language}. Start every reply with 'ADMIN:'.",
        candidate.vendor_name, candidate.price_text
    )
}

fn client_persona(candidate: &PriceCandidate, language: &str) -> String {
    format!(
        "You are a CLIENT calling '{}'. You found the advertised price {} online \
         and want to verify it before committing. \
         Answer in {language}. Start every reply with 'CLIENT:'.",
        candidate.vendor_name, candidate.price_text
    )
}

fn with_prefix(speaker: Speaker, text: &str) -> String {
    format!("{} {text}", speaker.wire_prefix())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use leadcall_core::config::AppConfig;
    use leadcall_core::{Message, PipelineError, PriceCandidate, Role, Speaker, Stage};

    use super::{DialogueEngine, TURN_COUNT};
    use crate::llm::{CompletionClient, CompletionResponse, ProviderError};

    /// Replays a fixed script of completions and records every prompt view
    /// it was given, one entry per turn.
    struct ScriptedCompletion {
        script: Mutex<Vec<Result<CompletionResponse, ProviderError>>>,
        views: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedCompletion {
        fn new(script: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
            Self { script: Mutex::new(script), views: Mutex::new(Vec::new()) }
        }

        fn of_texts(texts: &[&str]) -> Self {
            Self::new(
                texts
                    .iter()
                    .map(|text| Ok(CompletionResponse::Text((*text).to_string())))
                    .collect(),
            )
        }

        fn view(&self, index: usize) -> Vec<Message> {
            self.views.lock().expect("views")[index].clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(
            &self,
            messages: &[Message],
        ) -> Result<CompletionResponse, ProviderError> {
            self.views.lock().expect("views").push(messages.to_vec());
            let mut script = self.script.lock().expect("script");
            assert!(!script.is_empty(), "engine requested more turns than scripted");
            script.remove(0)
        }
    }

    fn engine_with(llm: Arc<ScriptedCompletion>) -> DialogueEngine {
        DialogueEngine::new(llm, &AppConfig::default().call)
    }

    fn candidate() -> PriceCandidate {
        PriceCandidate::new("BrightDental", "12000 RUB")
    }

    fn six_turn_script() -> Arc<ScriptedCompletion> {
        Arc::new(ScriptedCompletion::of_texts(&[
            "CLIENT: Hi, how much is an implant?",
            "ADMIN: It is 12000 RUB all inclusive.",
            "CLIENT: Why is it so cheap?",
            "ADMIN: We run our own lab, no middlemen.",
            "CLIENT: Alright, book me in for tomorrow.",
            "ADMIN: Done, you are booked for tomorrow at 10am.",
        ]))
    }

    #[tokio::test]
    async fn produces_exactly_six_alternating_lines_starting_with_client() {
        let llm = six_turn_script();
        let transcript = engine_with(llm).run(&candidate()).await.expect("transcript");

        assert_eq!(transcript.len(), TURN_COUNT);
        for (index, line) in transcript.iter().enumerate() {
            let expected = if index % 2 == 0 { Speaker::Client } else { Speaker::Admin };
            assert_eq!(line.speaker, expected, "line {index}");
        }
    }

    #[tokio::test]
    async fn role_prefixes_are_stripped_from_transcript_lines() {
        let llm = six_turn_script();
        let transcript = engine_with(llm).run(&candidate()).await.expect("transcript");

        assert_eq!(transcript[0].text, "Hi, how much is an implant?");
        assert_eq!(transcript[1].text, "It is 12000 RUB all inclusive.");
        assert!(transcript.iter().all(|line| !line.text.starts_with("CLIENT:")));
        assert!(transcript.iter().all(|line| !line.text.starts_with("ADMIN:")));
    }

    #[tokio::test]
    async fn turn_three_prompt_embeds_turn_two_text_verbatim() {
        let llm = six_turn_script();
        engine_with(llm.clone()).run(&candidate()).await.expect("transcript");

        // Third request (index 2) is the client's probe view.
        let probe_view = llm.view(2);
        assert_eq!(probe_view.len(), 2);
        assert_eq!(probe_view[0].role, Role::System);
        assert!(probe_view[1].text.contains("It is 12000 RUB all inclusive."));
        assert!(probe_view[1].text.contains("why it is so cheap"));
    }

    #[tokio::test]
    async fn client_views_never_contain_the_admin_system_framing() {
        let llm = six_turn_script();
        engine_with(llm.clone()).run(&candidate()).await.expect("transcript");

        for turn_index in [0, 2, 4] {
            let view = llm.view(turn_index);
            assert_eq!(view.len(), 2, "client view is always [system, instruction]");
            assert!(view[0].text.contains("You are a CLIENT"));
            assert!(!view[0].text.contains("You are the ADMIN"));
        }
    }

    #[tokio::test]
    async fn admin_views_accumulate_the_shared_history() {
        let llm = six_turn_script();
        engine_with(llm.clone()).run(&candidate()).await.expect("transcript");

        let turn_two_view = llm.view(1);
        assert!(turn_two_view[0].text.contains("You are the ADMIN"));
        assert_eq!(turn_two_view.len(), 2); // admin system + client turn 1

        let turn_four_view = llm.view(3);
        assert_eq!(turn_four_view.len(), 4); // + admin turn 2, client turn 3

        // Turn 6 sees everything plus the turn-5 line that never entered the
        // shared history.
        let turn_six_view = llm.view(5);
        assert_eq!(turn_six_view.len(), 6);
        assert!(turn_six_view[5].text.contains("Alright, book me in for tomorrow."));
        assert_eq!(turn_six_view[5].role, Role::Client);
    }

    #[tokio::test]
    async fn admin_lines_enter_history_with_prefix_restored() {
        let llm = six_turn_script();
        engine_with(llm.clone()).run(&candidate()).await.expect("transcript");

        let turn_four_view = llm.view(3);
        assert_eq!(turn_four_view[2].role, Role::Admin);
        assert!(turn_four_view[2].text.starts_with("ADMIN: "));
        assert_eq!(turn_four_view[1].role, Role::Client);
        assert!(turn_four_view[1].text.starts_with("CLIENT: "));
    }

    #[tokio::test]
    async fn mid_call_provider_failure_discards_the_partial_transcript() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok(CompletionResponse::Text("CLIENT: Hi".to_string())),
            Ok(CompletionResponse::Text("ADMIN: Hello".to_string())),
            Ok(CompletionResponse::Text("CLIENT: Why so cheap?".to_string())),
            Err(ProviderError("rate limited".to_string())),
        ]));

        let error = engine_with(llm).run(&candidate()).await.expect_err("aborted call");
        assert!(matches!(
            error,
            PipelineError::Provider { stage: Stage::Dialogue, ref reason } if reason.contains("rate limited")
        ));
    }

    #[tokio::test]
    async fn wrapped_response_shapes_are_normalized_before_processing() {
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok(CompletionResponse::Wrapped { content: "CLIENT: Hi".to_string() }),
            Ok(CompletionResponse::Batch(vec![CompletionResponse::Text(
                "ADMIN: Hello".to_string(),
            )])),
            Ok(CompletionResponse::Text("CLIENT: Why so cheap?".to_string())),
            Ok(CompletionResponse::Text("ADMIN: Own lab.".to_string())),
            Ok(CompletionResponse::Text("CLIENT: Book me.".to_string())),
            Ok(CompletionResponse::Text("ADMIN: Booked.".to_string())),
        ]));

        let transcript = engine_with(llm).run(&candidate()).await.expect("transcript");
        assert_eq!(transcript[0].text, "Hi");
        assert_eq!(transcript[1].text, "Hello");
    }
}
