use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::*;
use crate::convert::{MAX_HEIGHT, MAX_WIDTH};

static DEFAULT_MAX_SIZE: LazyLock<String> =
    LazyLock::new(|| format!("{}x{}", MAX_WIDTH, MAX_HEIGHT));

pub(crate) fn default_max_size() -> &'static str {
    DEFAULT_MAX_SIZE.as_str()
}

#[derive(Parser, Debug, Clone)]
#[command(name = "rawimg", version, args_conflicts_with_subcommands = true)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: Option<SubCommand>,
    /// 不指定子命令时按默认参数执行 convert
    #[command(flatten)]
    pub convert: ConvertCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 把目录中的 JPEG 图片转换为原始像素文件（.img）
    Convert(ConvertCommand),
    /// 查看 .img 文件的尺寸并校验其完整性
    Inspect(InspectCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

/// 解析 `WIDTHxHEIGHT` 格式的尺寸
pub fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("无效的尺寸: {}", s));
    }
    Ok((parts[0].trim().parse()?, parts[1].trim().parse()?))
}

/// 文件后缀不带 `.`，与扩展名整体比较
pub fn parse_suffix(s: &str) -> anyhow::Result<String> {
    if s.is_empty() || s.contains('.') {
        return Err(anyhow::anyhow!("无效的后缀: {}", s));
    }
    Ok(s.to_string())
}
