//! External training and generation collaborators.
//!
//! Model training and text generation run outside this program. Both are
//! configured as a command line in the YAML config (`training.command`,
//! `generation.command`); the request fields are appended as long flags.
//!
//! Training streams its own progress to the terminal. Generation prints the
//! generated text on stdout, which is captured and returned.

use async_trait::async_trait;
use corpus_harvester_core::config::Config;
use corpus_harvester_core::contract::{
    CollaboratorError, GenerationRequest, Generator, Trainer, TrainingRequest,
};
use std::process::Command;
use tracing::{error, info};

fn split_command<'c>(
    command: &'c [String],
    role: &'static str,
) -> Result<(&'c String, &'c [String]), CollaboratorError> {
    command
        .split_first()
        .ok_or(CollaboratorError::NotConfigured(role))
}

pub struct CommandTrainer {
    command: Vec<String>,
}

impl CommandTrainer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.training.command.clone())
    }
}

#[async_trait]
impl Trainer for CommandTrainer {
    async fn train(&self, request: &TrainingRequest) -> Result<(), CollaboratorError> {
        let (program, args) = split_command(&self.command, "training")?;
        if !request.corpus_path.is_file() {
            error!(corpus = %request.corpus_path.display(), "Training corpus not found");
            return Err(CollaboratorError::MissingInput(request.corpus_path.clone()));
        }

        info!(
            program = %program,
            base_model = %request.base_model,
            corpus = %request.corpus_path.display(),
            output_dir = %request.output_dir.display(),
            "[TRAIN] Starting training command"
        );
        let status = Command::new(program)
            .args(args)
            .arg("--base-model")
            .arg(&request.base_model)
            .arg("--train-file")
            .arg(&request.corpus_path)
            .arg("--output-dir")
            .arg(&request.output_dir)
            .arg("--epochs")
            .arg(request.epochs.to_string())
            .arg("--batch-size")
            .arg(request.batch_size.to_string())
            .arg("--learning-rate")
            .arg(request.learning_rate.to_string())
            .arg("--block-size")
            .arg(request.block_size.to_string())
            .status()
            .map_err(|e| CollaboratorError::Launch {
                program: program.clone(),
                source: e,
            })?;

        if status.success() {
            info!(output_dir = %request.output_dir.display(), "[TRAIN] Training finished");
            Ok(())
        } else {
            error!(status = ?status, "[TRAIN][ERROR] Training command failed");
            Err(CollaboratorError::Failed {
                program: program.clone(),
                status: status.to_string(),
                stderr: String::from("see training output above"),
            })
        }
    }
}

pub struct CommandGenerator {
    command: Vec<String>,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.generation.command.clone())
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CollaboratorError> {
        if !request.model_dir.is_dir() {
            error!(model_dir = %request.model_dir.display(), "Model directory not found");
            return Err(CollaboratorError::ModelMissing(request.model_dir.clone()));
        }
        let (program, args) = split_command(&self.command, "generation")?;

        info!(
            program = %program,
            model_dir = %request.model_dir.display(),
            max_length = request.max_length,
            "[GENERATE] Running generation command"
        );
        let output = Command::new(program)
            .args(args)
            .arg("--model-dir")
            .arg(&request.model_dir)
            .arg("--prompt")
            .arg(&request.prompt)
            .arg("--max-length")
            .arg(request.max_length.to_string())
            .output()
            .map_err(|e| CollaboratorError::Launch {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = ?output.status, stderr = %stderr, "[GENERATE][ERROR] Generation command failed");
            return Err(CollaboratorError::Failed {
                program: program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| CollaboratorError::Output(e.to_string()))?;
        Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sh(script: &str, arg0: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into(), arg0.into()]
    }

    fn training_request(corpus: &std::path::Path, output: &std::path::Path) -> TrainingRequest {
        TrainingRequest {
            base_model: "distilgpt2".into(),
            corpus_path: corpus.to_path_buf(),
            output_dir: output.to_path_buf(),
            epochs: 3,
            batch_size: 4,
            learning_rate: 2e-5,
            block_size: 1000,
        }
    }

    #[tokio::test]
    async fn trainer_passes_hyperparameters_as_flags() {
        let tmp = tempdir().unwrap();
        let corpus = tmp.path().join("train.txt");
        fs::write(&corpus, "corpus").unwrap();
        let args_file = tmp.path().join("args.txt");
        let trainer = CommandTrainer::new(sh(
            r#"printf '%s\n' "$@" > "$0""#,
            args_file.to_str().unwrap(),
        ));

        trainer
            .train(&training_request(&corpus, &tmp.path().join("model")))
            .await
            .expect("training command should succeed");

        let args = fs::read_to_string(&args_file).unwrap();
        let lines: Vec<_> = args.lines().collect();
        assert_eq!(lines[0], "--base-model");
        assert_eq!(lines[1], "distilgpt2");
        assert!(lines.contains(&"--block-size"));
        assert_eq!(lines.last(), Some(&"1000"));
    }

    #[tokio::test]
    async fn trainer_requires_the_corpus() {
        let tmp = tempdir().unwrap();
        let trainer = CommandTrainer::new(sh("exit 0", "train"));

        let err = trainer
            .train(&training_request(&tmp.path().join("missing.txt"), tmp.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, CollaboratorError::MissingInput(_)));
    }

    #[tokio::test]
    async fn trainer_without_command_is_not_configured() {
        let tmp = tempdir().unwrap();
        let corpus = tmp.path().join("train.txt");
        fs::write(&corpus, "corpus").unwrap();

        let err = CommandTrainer::new(Vec::new())
            .train(&training_request(&corpus, tmp.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, CollaboratorError::NotConfigured("training")));
    }

    #[tokio::test]
    async fn generator_returns_stdout() {
        let tmp = tempdir().unwrap();
        let generator = CommandGenerator::new(sh(r#"echo "generated: $4""#, "generate"));
        let request = GenerationRequest {
            model_dir: tmp.path().to_path_buf(),
            prompt: "const Navbar =".into(),
            max_length: 200,
        };

        let text = generator.generate(&request).await.unwrap();

        assert_eq!(text, "generated: const Navbar =");
    }

    #[tokio::test]
    async fn generator_reports_missing_model() {
        let tmp = tempdir().unwrap();
        let generator = CommandGenerator::new(sh("echo never", "generate"));
        let request = GenerationRequest {
            model_dir: tmp.path().join("models/none"),
            prompt: "x".into(),
            max_length: 10,
        };

        let err = generator.generate(&request).await.unwrap_err();

        assert!(matches!(err, CollaboratorError::ModelMissing(_)));
        assert!(err.to_string().contains("did you train it first?"));
    }

    #[tokio::test]
    async fn failing_generation_carries_stderr() {
        let tmp = tempdir().unwrap();
        let generator = CommandGenerator::new(sh("echo boom >&2; exit 3", "generate"));
        let request = GenerationRequest {
            model_dir: tmp.path().to_path_buf(),
            prompt: "x".into(),
            max_length: 10,
        };

        let err = generator.generate(&request).await.unwrap_err();

        match err {
            CollaboratorError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
