use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use log::info;
use serde::Serialize;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat, default_max_size, parse_size, parse_suffix};
use crate::convert::*;

#[derive(Parser, Debug, Clone)]
pub struct ConvertCommand {
    /// JPEG 图片所在目录，只扫描一层
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_INPUT_DIR)]
    pub input: PathBuf,
    /// .img 文件的输出目录，必须已经存在
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,
    /// 处理的文件后缀，区分大小写，不带 `.`
    #[arg(short, long, value_parser = parse_suffix, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,
    /// 图片最大尺寸，宽**或**高超过这个尺寸的图片会被跳过
    #[arg(short = 'S', long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, verbatim_doc_comment, default_value = default_max_size())]
    pub max_size: (u32, u32),
    /// 解码失败时跳过该图片继续处理，全部处理完后再返回错误
    #[arg(short, long)]
    pub keep_going: bool,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl From<&ConvertCommand> for ConvertOptions {
    fn from(cmd: &ConvertCommand) -> Self {
        Self {
            input_dir: cmd.input.clone(),
            output_dir: cmd.output.clone(),
            suffix: cmd.suffix.clone(),
            max_size: cmd.max_size,
            keep_going: cmd.keep_going,
        }
    }
}

#[derive(Serialize)]
struct FileReport {
    path: PathBuf,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Serialize)]
struct ConvertReport {
    files: Vec<FileReport>,
    summary: Summary,
}

impl SubCommandExtend for ConvertCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let converter = Converter::new(self.into());

        let mut files = vec![];
        let summary = converter.convert_all(|path, outcome| match self.output_format {
            OutputFormat::Table => print_outcome(path, outcome),
            OutputFormat::Json => {
                if *outcome != Outcome::SkippedUnsupportedType {
                    files.push(FileReport { path: path.to_path_buf(), outcome: outcome.clone() });
                }
            }
        })?;

        match self.output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&ConvertReport { files, summary })?)
            }
            OutputFormat::Table => {
                info!(
                    "转换完成: 生成 {} 个，尺寸过大 {} 个，忽略 {} 个，失败 {} 个",
                    summary.converted,
                    summary.skipped_oversized,
                    summary.skipped_unsupported,
                    summary.failed
                );
            }
        }

        if summary.failed > 0 {
            bail!("{} 个文件转换失败", summary.failed);
        }
        Ok(())
    }
}

fn print_outcome(path: &Path, outcome: &Outcome) {
    let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
    match outcome {
        Outcome::Converted { output, width, height } => {
            println!("[OK] {} ({}x{}) was generated", output.display(), width, height)
        }
        Outcome::SkippedOversized { width, height } => {
            println!("[SKIP] {} ({}x{}) is too large, ignored", name, width, height)
        }
        Outcome::Failed { reason } => eprintln!("[ERR] {}", reason),
        Outcome::SkippedUnsupportedType => {}
    }
}
