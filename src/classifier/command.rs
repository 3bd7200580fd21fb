//! 外部コマンドによる特徴推定
//!
//! `<program> <args...> <label>...` を実行し、画像データを標準入力に渡す。
//! 標準出力の1行目（前後の空白を除く）を推定ラベルとして受け取る。

use super::AttributeClassifier;
use crate::error::{CharaAiError, Result};
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 設定の `classifier_command`（先頭がプログラム）から作る
    pub fn from_command_line(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CharaAiError::Config("特徴推定コマンドが設定されていません".into()))?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    fn run(&self, image: &[u8], labels: &[&str]) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(labels)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CharaAiError::Classifier(format!("{} を起動できません: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .map_err(|e| CharaAiError::Classifier(format!("画像データを渡せません: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| CharaAiError::Classifier(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CharaAiError::Classifier(format!(
                "{} failed (code {:?}): {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("").trim().to_string())
    }
}

impl AttributeClassifier for CommandClassifier {
    fn classify(&self, image: &[u8], labels: &[&str]) -> Result<String> {
        let label = self.run(image, labels)?;
        tracing::debug!(program = %self.program, label = %label, "推定結果");

        if labels.contains(&label.as_str()) {
            Ok(label)
        } else {
            Err(CharaAiError::ClassifierParse(format!(
                "候補にないラベル \"{}\"（候補: {}）",
                label,
                labels.join(", ")
            )))
        }
    }
}
