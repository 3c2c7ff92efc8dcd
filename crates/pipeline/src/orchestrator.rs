//! Ties the pipeline steps together into one conversion run: optional-LLM branching, resume
//! support, the voice-review pause, and a broadcast channel of progress events.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bookvoice_config::Settings;
use bookvoice_core::{
    AudioEncoder, CancellationToken, Character, DictionaryService, FileNameEntry, KeepAwake,
    LlmService, PipelineContext, SpeakerAssignment, TtsSynth, VoiceId, VoiceMap, NARRATOR,
};
use tokio::sync::{broadcast, Mutex, Notify};
use tracing::info;

use crate::error::PipelineError;
use crate::resume::{ResumeInfo, ResumeManager};
use crate::runner::{PauseHandler, PipelineRunner};
use crate::step::{ProgressEvent, ProgressSink, StepDeps};
use crate::steps::{
    ApplyDictionary, AssignSpeakers, AssignVoicesInitial, AudioMerge, Cleanup, ExtractCharacters,
    RemapVoices, Sanitize, TtsConvert,
};
use crate::text::narrator_only_assignments;

/// Progress and lifecycle events emitted over the course of a run. Subscribers get every
/// review checkpoint and every status tick through this single channel rather than a
/// collection of disjoint callbacks.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    ConversionStarted,
    Status {
        step_name: &'static str,
        current: u64,
        total: u64,
        message: String,
    },
    TaskComplete {
        part_index: u32,
        filename: String,
    },
    TaskError {
        part_index: u32,
        message: String,
    },
    CharactersReady(Vec<Character>),
    VoiceMapReady(VoiceMap),
    AssignmentsReady(Vec<SpeakerAssignment>),
    Error {
        message: String,
        code: String,
    },
    Finished {
        saved_file_count: usize,
    },
}

/// Decides, given what a prior interrupted run left behind, whether to resume from it or
/// start fresh.
#[async_trait]
pub trait ResumeConfirmation: Send + Sync {
    async fn await_resume_confirmation(&self, info: ResumeInfo) -> bool;
}

/// Always resumes without asking — the orchestrator's default when no confirmation
/// collaborator is supplied.
pub struct AlwaysResume;

#[async_trait]
impl ResumeConfirmation for AlwaysResume {
    async fn await_resume_confirmation(&self, _info: ResumeInfo) -> bool {
        true
    }
}

/// Invoked after `remap_voices` completes: publishes the characters, voice map, and
/// assignments for review, then waits for `Orchestrator::resume_after_voice_review` before
/// continuing. An edited voice map handed back through that call replaces `ctx.voice_map` and
/// is propagated onto every assignment's `voice_id` before TTS dispatch.
struct VoiceReviewPause {
    events: broadcast::Sender<OrchestratorEvent>,
    gate: Arc<Notify>,
    edited_voice_map: Arc<Mutex<Option<VoiceMap>>>,
}

#[async_trait]
impl PauseHandler for VoiceReviewPause {
    async fn handle(&self, ctx: &mut PipelineContext) {
        let _ = self.events.send(OrchestratorEvent::CharactersReady(
            ctx.characters.clone().unwrap_or_default(),
        ));
        let _ = self.events.send(OrchestratorEvent::VoiceMapReady(
            ctx.voice_map.clone().unwrap_or_default(),
        ));
        let _ = self.events.send(OrchestratorEvent::AssignmentsReady(
            ctx.assignments.clone().unwrap_or_default(),
        ));

        self.gate.notified().await;

        if let Some(edited) = self.edited_voice_map.lock().await.take() {
            if let Some(assignments) = ctx.assignments.as_mut() {
                for assignment in assignments.iter_mut() {
                    if let Some(voice) = edited.get(&assignment.speaker) {
                        assignment.voice_id = voice.clone();
                    }
                }
            }
            ctx.voice_map = Some(edited);
        }
    }
}

/// One conversion run's collaborators, bound once at construction. `settings` is cloned into
/// every step's `StepDeps` as the input snapshot (§4.7): edits to the caller's live config
/// after `Orchestrator::new` cannot perturb a run already in flight. `llm` is `None` when no
/// LLM is configured — character extraction, speaker assignment, and voice remap are then
/// skipped entirely in favor of a deterministic narrator-only read-through.
pub struct Orchestrator {
    llm: Option<Arc<dyn LlmService>>,
    tts: Arc<dyn TtsSynth>,
    encoder: Arc<dyn AudioEncoder>,
    dictionary: Option<Arc<dyn DictionaryService>>,
    keep_awake: Arc<dyn KeepAwake>,
    resume_confirmation: Arc<dyn ResumeConfirmation>,
    settings: Settings,
    output_dir: PathBuf,
    events: broadcast::Sender<OrchestratorEvent>,
    voice_review_gate: Arc<Notify>,
    edited_voice_map: Arc<Mutex<Option<VoiceMap>>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Option<Arc<dyn LlmService>>,
        tts: Arc<dyn TtsSynth>,
        encoder: Arc<dyn AudioEncoder>,
        dictionary: Option<Arc<dyn DictionaryService>>,
        keep_awake: Arc<dyn KeepAwake>,
        settings: Settings,
        output_dir: PathBuf,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            llm,
            tts,
            encoder,
            dictionary,
            keep_awake,
            resume_confirmation: Arc::new(AlwaysResume),
            settings,
            output_dir,
            events,
            voice_review_gate: Arc::new(Notify::new()),
            edited_voice_map: Arc::new(Mutex::new(None)),
        }
    }

    /// Overrides the default always-resume policy with a caller-supplied confirmation
    /// collaborator, e.g. one that prompts a user before reusing a prior run's chunks.
    pub fn with_resume_confirmation(mut self, resume_confirmation: Arc<dyn ResumeConfirmation>) -> Self {
        self.resume_confirmation = resume_confirmation;
        self
    }

    /// Subscribes to this run's progress events. Call before `run` to avoid missing any
    /// events emitted early in the run.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    /// Resolves the pause inserted after voice remap, letting a paused run continue. Pass the
    /// reviewer's edited voice map to have it replace the allocator's output (and propagate
    /// onto every assignment's voice), or `None` to proceed with the map as allocated.
    pub async fn resume_after_voice_review(&self, edited_voice_map: Option<VoiceMap>) {
        *self.edited_voice_map.lock().await = edited_voice_map;
        self.voice_review_gate.notify_one();
    }

    /// Runs every step in order, resuming from a prior `pipeline_state.json` when one exists
    /// and the resume confirmation collaborator agrees to it.
    pub async fn run(
        &self,
        text: String,
        file_names: Vec<FileNameEntry>,
        cancellation: CancellationToken,
    ) -> Result<PipelineContext, PipelineError> {
        let _ = self.events.send(OrchestratorEvent::ConversionStarted);
        self.keep_awake.acquire().await?;

        let result = self.run_steps(text, file_names, cancellation).await;

        self.keep_awake.release().await;
        result
    }

    async fn run_steps(
        &self,
        text: String,
        file_names: Vec<FileNameEntry>,
        cancellation: CancellationToken,
    ) -> Result<PipelineContext, PipelineError> {
        let resumed_state = match ResumeManager::check(&self.output_dir).await {
            Some(info) if self.resume_confirmation.await_resume_confirmation(info).await => {
                ResumeManager::load_state(&self.output_dir).await?
            }
            _ => None,
        };

        let mut ctx = match resumed_state {
            Some(state) => {
                info!("resuming from existing pipeline state");
                PipelineContext::new(text, file_names).from_resumed_state(state)
            }
            None => PipelineContext::new(text, file_names),
        };

        let events = self.events.clone();
        let events_complete = events.clone();
        let events_error = events.clone();
        let events_step_error = events.clone();
        let on_status: ProgressSink = Arc::new(move |event: ProgressEvent| {
            let _ = events.send(OrchestratorEvent::Status {
                step_name: event.step_name,
                current: event.current,
                total: event.total,
                message: event.message,
            });
        });
        let on_task_complete: Arc<dyn Fn(u32, String) + Send + Sync> =
            Arc::new(move |part_index, filename| {
                let _ = events_complete.send(OrchestratorEvent::TaskComplete { part_index, filename });
            });
        let on_task_error: Arc<dyn Fn(u32, String) + Send + Sync> =
            Arc::new(move |part_index, message| {
                let _ = events_error.send(OrchestratorEvent::TaskError { part_index, message });
            });
        let on_error: Arc<dyn Fn(String, String) + Send + Sync> = Arc::new(move |message, code| {
            let _ = events_step_error.send(OrchestratorEvent::Error { message, code });
        });

        let deps = StepDeps {
            llm: self.llm.clone(),
            tts: self.tts.clone(),
            encoder: self.encoder.clone(),
            dictionary: self.dictionary.clone(),
            settings: self.settings.clone(),
            output_dir: self.output_dir.clone(),
            cancellation,
            on_status: Some(on_status),
            on_task_complete: Some(on_task_complete),
            on_task_error: Some(on_task_error),
            on_error: Some(on_error),
        };

        let mut runner = PipelineRunner::new();

        if self.llm.is_some() {
            runner = runner
                .add_step(Box::new(ExtractCharacters))
                .add_step(Box::new(AssignVoicesInitial))
                .add_step(Box::new(AssignSpeakers))
                .add_step(Box::new(RemapVoices));

            // Review happens after the frequency-based remap, while the cheap LLM and
            // allocator stages are all still fresh but before any TTS call has been
            // dispatched.
            runner.register_pause(
                "remap_voices",
                Arc::new(VoiceReviewPause {
                    events: self.events.clone(),
                    gate: self.voice_review_gate.clone(),
                    edited_voice_map: self.edited_voice_map.clone(),
                }),
            );
        } else {
            let narrator_voice = VoiceId::new(self.settings.voice.narrator_voice.clone());
            let mut voice_map: VoiceMap = BTreeMap::new();
            voice_map.insert(NARRATOR.to_string(), narrator_voice.clone());

            ctx.characters = Some(Vec::new());
            ctx.voice_map = Some(voice_map);
            ctx.assignments = Some(narrator_only_assignments(&ctx.text, &narrator_voice));
        }

        let runner = runner
            .add_step(Box::new(Sanitize))
            .add_step(Box::new(ApplyDictionary))
            .add_step(Box::new(TtsConvert))
            .add_step(Box::new(AudioMerge))
            .add_step(Box::new(Cleanup));

        runner.run(&mut ctx, &deps).await?;

        let saved_file_count = ctx.saved_file_count.unwrap_or(0);
        let _ = self.events.send(OrchestratorEvent::Finished { saved_file_count });
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ConcatEncoder, EchoTts, NoopKeepAwake};
    use async_trait::async_trait;
    use bookvoice_core::{collaborators::ProgressFn, Character, CoreError, VoiceId};
    use tempfile::tempdir;

    /// Always attributes every block to the narrator with no characters at all.
    struct NarratorOnlyLlm;

    #[async_trait]
    impl LlmService for NarratorOnlyLlm {
        async fn extract_characters(
            &self,
            _text_blocks: &[String],
            _on_progress: Option<ProgressFn>,
        ) -> Result<Vec<Character>, CoreError> {
            Ok(Vec::new())
        }

        async fn assign_speakers(
            &self,
            text_blocks: &[String],
            _voice_map: &VoiceMap,
            _characters: &[Character],
            _on_progress: Option<ProgressFn>,
        ) -> Result<Vec<SpeakerAssignment>, CoreError> {
            Ok(text_blocks
                .iter()
                .enumerate()
                .map(|(i, text)| SpeakerAssignment {
                    sentence_index: i as u32,
                    text: text.clone(),
                    speaker: NARRATOR.to_string(),
                    voice_id: VoiceId::new("narrator-voice"),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn a_narration_only_run_produces_one_merged_output_file() {
        let dir = tempdir().unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            Some(Arc::new(NarratorOnlyLlm)),
            Arc::new(EchoTts),
            Arc::new(ConcatEncoder),
            None,
            Arc::new(NoopKeepAwake),
            Settings::default(),
            dir.path().to_path_buf(),
        ));

        let mut events = orchestrator.subscribe();
        let resumer = orchestrator.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(OrchestratorEvent::AssignmentsReady(_)) => {
                        resumer.resume_after_voice_review(None).await;
                        break;
                    }
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
        });

        let ctx = orchestrator
            .run(
                "Once upon a time.".to_string(),
                vec![("Chapter 1".to_string(), 0)],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(ctx.saved_file_count, Some(1));
        assert!(dir.path().join("Chapter 1").join("Chapter 1.opus").exists());
    }

    #[tokio::test]
    async fn a_run_with_no_llm_configured_uses_the_narrator_voice_for_every_line() {
        let dir = tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            None,
            Arc::new(EchoTts),
            Arc::new(ConcatEncoder),
            None,
            Arc::new(NoopKeepAwake),
            Settings::default(),
            dir.path().to_path_buf(),
        );

        let ctx = orchestrator
            .run(
                "Once upon a time.\n\nThe end.".to_string(),
                vec![("Chapter 1".to_string(), 0)],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(ctx.saved_file_count, Some(1));
        assert!(dir.path().join("Chapter 1").join("Chapter 1.opus").exists());
    }
}
