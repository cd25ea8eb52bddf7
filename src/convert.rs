use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::{DynamicImage, ImageReader, RgbImage};
use log::{debug, info};
use serde::Serialize;
use walkdir::WalkDir;

use crate::record::{CHANNELS, RawImageRecord};

/// 默认输入目录
pub const DEFAULT_INPUT_DIR: &str = "./images";
/// 默认输出目录
pub const DEFAULT_OUTPUT_DIR: &str = "./resource";
/// 默认处理的文件后缀，区分大小写
pub const DEFAULT_SUFFIX: &str = "jpg";
/// 读取方能接受的最大宽度
pub const MAX_WIDTH: u32 = 640;
/// 读取方能接受的最大高度
pub const MAX_HEIGHT: u32 = 480;
/// 输出文件后缀
pub const OUTPUT_EXTENSION: &str = "img";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// 不含 `.`，与文件扩展名整体比较
    pub suffix: String,
    /// (宽, 高)
    pub max_size: (u32, u32),
    /// 解码失败时跳过该文件而不是中止
    pub keep_going: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            suffix: DEFAULT_SUFFIX.to_string(),
            max_size: (MAX_WIDTH, MAX_HEIGHT),
            keep_going: false,
        }
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Converted { output: PathBuf, width: u32, height: u32 },
    /// 后缀不匹配，静默跳过
    SkippedUnsupportedType,
    SkippedOversized { width: u32, height: u32 },
    /// 仅在 `keep_going` 时出现
    Failed { reason: String },
}

/// 一次转换的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub converted: usize,
    pub skipped_unsupported: usize,
    pub skipped_oversized: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Converted { .. } => self.converted += 1,
            Outcome::SkippedUnsupportedType => self.skipped_unsupported += 1,
            Outcome::SkippedOversized { .. } => self.skipped_oversized += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct Converter {
    opts: ConvertOptions,
}

impl Converter {
    pub fn new(opts: ConvertOptions) -> Self {
        Self { opts }
    }

    /// 转换输入目录下的所有文件，每处理完一个文件调用一次 `on_outcome`
    ///
    /// 目录只扫描一层，顺序取决于文件系统。输出目录必须已存在。
    pub fn convert_all<F>(&self, mut on_outcome: F) -> Result<Summary>
    where
        F: FnMut(&Path, &Outcome),
    {
        let (input_dir, output_dir) = (&self.opts.input_dir, &self.opts.output_dir);
        if !input_dir.is_dir() {
            bail!("输入目录不存在: {}", input_dir.display());
        }
        if !output_dir.is_dir() {
            bail!("输出目录不存在: {}", output_dir.display());
        }

        info!("开始转换: {} -> {}", input_dir.display(), output_dir.display());

        let mut summary = Summary::default();
        // 不跟随链接，避免失效的链接在过滤后缀之前就中断遍历
        for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
            let entry =
                entry.with_context(|| format!("无法读取目录 {}", input_dir.display()))?;
            let outcome = self.classify(entry.path())?;
            on_outcome(entry.path(), &outcome);
            summary.record(&outcome);
        }

        Ok(summary)
    }

    /// 处理单个文件：过滤、解码、检查尺寸并写出
    ///
    /// 读写失败总是返回错误；解码失败只有在 `keep_going` 时才会变为 [`Outcome::Failed`]。
    pub fn classify(&self, path: &Path) -> Result<Outcome> {
        let Some(stem) = self.matching_stem(path) else {
            debug!("跳过后缀不匹配的文件: {}", path.display());
            return Ok(Outcome::SkippedUnsupportedType);
        };
        // 目录、失效的链接等
        if !path.is_file() {
            debug!("跳过非文件: {}", path.display());
            return Ok(Outcome::SkippedUnsupportedType);
        }

        let reader = ImageReader::open(path)
            .with_context(|| format!("无法打开 {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("无法读取 {}", path.display()))?;
        let image = match decode_rgb(reader.decode()) {
            Ok(image) => image,
            Err(e) => {
                let e = e.context(format!("无法解码 {}", path.display()));
                if self.opts.keep_going {
                    return Ok(Outcome::Failed { reason: format!("{:#}", e) });
                }
                return Err(e);
            }
        };

        let (width, height) = image.dimensions();
        let (max_width, max_height) = self.opts.max_size;
        if width > max_width || height > max_height {
            return Ok(Outcome::SkippedOversized { width, height });
        }

        let output = self.output_path(stem);
        RawImageRecord::from(image).save(&output)?;
        Ok(Outcome::Converted { output, width, height })
    }

    /// 后缀匹配时返回去掉后缀的文件名
    ///
    /// 直接比较 `OsStr`，文件名不是合法 UTF-8 时也能处理。`.jpg` 这样的隐藏文件没有扩展名。
    fn matching_stem<'a>(&self, path: &'a Path) -> Option<&'a OsStr> {
        if path.extension()? != OsStr::new(&self.opts.suffix) {
            return None;
        }
        path.file_stem()
    }

    fn output_path(&self, stem: &OsStr) -> PathBuf {
        let mut name = OsString::from(stem);
        name.push(".");
        name.push(OUTPUT_EXTENSION);
        self.opts.output_dir.join(name)
    }
}

/// 只接受 8 位 RGB，灰度图等其他布局不做转换
fn decode_rgb(decoded: image::ImageResult<DynamicImage>) -> Result<RgbImage> {
    match decoded? {
        DynamicImage::ImageRgb8(image) => Ok(image),
        other => bail!("通道数不符: 需要 {} 通道 8 位 RGB，实际为 {:?}", CHANNELS, other.color()),
    }
}
