use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use image::ImageFormat;
use log::info;
use serde::Serialize;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat, default_max_size, parse_size};
use crate::record::{RawImageRecord, RecordInfo};

#[derive(Parser, Debug, Clone)]
pub struct InspectCommand {
    /// .img 文件路径
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// 读取方能接受的最大尺寸
    #[arg(short = 'S', long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = default_max_size())]
    pub max_size: (u32, u32),
    /// 把图片导出为 PNG 方便查看，只能用于单个文件
    #[arg(short, long, value_name = "PNG")]
    pub export: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

#[derive(Serialize)]
struct InspectReport {
    path: PathBuf,
    #[serde(flatten)]
    info: RecordInfo,
    /// 是否在最大尺寸以内
    fits: bool,
}

impl SubCommandExtend for InspectCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        if self.export.is_some() && self.files.len() != 1 {
            bail!("--export 只能用于单个文件");
        }

        let (max_width, max_height) = self.max_size;
        let mut reports = vec![];
        for path in &self.files {
            let record = RawImageRecord::open(path)?;
            let info = record.info();
            let fits = info.width <= max_width && info.height <= max_height;
            reports.push(InspectReport { path: path.clone(), info, fits });

            if let Some(export) = &self.export {
                record
                    .to_rgb_image()?
                    .save_with_format(export, ImageFormat::Png)
                    .with_context(|| format!("无法导出 {}", export.display()))?;
                info!("已导出 {}", export.display());
            }
        }

        match self.output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&reports)?)
            }
            OutputFormat::Table => {
                for r in &reports {
                    println!(
                        "{}\t{}x{}\t{} bytes\t{}",
                        r.path.display(),
                        r.info.width,
                        r.info.height,
                        r.info.pixel_bytes,
                        if r.fits { "ok" } else { "too large" }
                    );
                }
            }
        }
        Ok(())
    }
}
