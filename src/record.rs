//! 原始图像记录（`.img`）格式
//!
//! | 偏移 | 大小 | 字段 |
//! |---|---|---|
//! | 0 | 4 | 宽度，u32 小端 |
//! | 4 | 4 | 高度，u32 小端 |
//! | 8 | 宽 × 高 × 3 | RGB 像素，按行存储 |
//!
//! 文件中没有魔数、版本号和通道数，读取方必须按 3 通道 RGB 解析。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use image::RgbImage;
use serde::Serialize;

/// 每个像素的通道数，固定为 RGB
pub const CHANNELS: usize = 3;
/// 文件头长度：宽、高各 4 字节
pub const HEADER_LEN: usize = 8;
/// 读取时预先分配的最大字节数，头部中的尺寸不可信
const MAX_PREALLOC: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageRecord {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// 记录的概要信息，用于输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_bytes: usize,
}

/// 给定尺寸下像素数据应有的字节数
pub fn pixel_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| anyhow!("图片尺寸溢出: {}x{}", width, height))
}

/// 读取文件头，返回 (宽, 高)
pub fn read_header<R: Read>(reader: &mut R) -> Result<(u32, u32)> {
    let width = reader.read_u32::<LittleEndian>().context("读取宽度失败")?;
    let height = reader.read_u32::<LittleEndian>().context("读取高度失败")?;
    Ok((width, height))
}

impl RawImageRecord {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = pixel_len(width, height)?;
        if pixels.len() != expected {
            bail!(
                "像素数据长度不匹配: {}x{} 需要 {} 字节，实际 {} 字节",
                width,
                height,
                expected,
                pixels.len()
            );
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn info(&self) -> RecordInfo {
        RecordInfo { width: self.width, height: self.height, pixel_bytes: self.pixels.len() }
    }

    /// 序列化后的总字节数
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.pixels.len()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        writer.write_all(&self.pixels)?;
        Ok(())
    }

    /// 读取一条完整记录，头部或像素数据不完整、或存在多余数据时报错
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let (width, height) = read_header(reader)?;
        let len = pixel_len(width, height)?;

        let mut pixels = Vec::with_capacity(len.min(MAX_PREALLOC));
        let read = reader.by_ref().take(len as u64).read_to_end(&mut pixels)?;
        if read != len {
            bail!("像素数据不完整: {}x{} 需要 {} 字节，只读取到 {} 字节", width, height, len, read);
        }

        let mut probe = [0u8; 1];
        if reader.read(&mut probe)? != 0 {
            bail!("像素数据之后存在多余字节");
        }

        Ok(Self { width, height, pixels })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("无法打开 {}", path.display()))?;
        Self::read_from(&mut BufReader::new(file))
            .with_context(|| format!("无法解析 {}", path.display()))
    }

    /// 写入文件，文件已存在时会被截断
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("无法创建 {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer).with_context(|| format!("写入 {} 失败", path.display()))?;
        writer.flush().with_context(|| format!("写入 {} 失败", path.display()))?;
        Ok(())
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("无法从像素数据构建图片"))
    }
}

impl From<RgbImage> for RawImageRecord {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height, pixels: image.into_raw() }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn gradient(width: u32, height: u32) -> RawImageRecord {
        let pixels = (0..width * height * CHANNELS as u32).map(|i| (i % 251) as u8).collect();
        RawImageRecord::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let record = RawImageRecord::new(640, 480, vec![0; 640 * 480 * 3]).unwrap();
        let mut buf = vec![];
        record.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), 8 + 640 * 480 * 3);
        assert_eq!(buf.len(), record.encoded_len());
        assert_eq!(&buf[..8], &[0x80, 0x02, 0x00, 0x00, 0xE0, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_pixels_follow_header_unchanged() {
        let record = gradient(5, 3);
        let mut buf = vec![];
        record.write_to(&mut buf).unwrap();

        assert_eq!(read_header(&mut Cursor::new(&buf)).unwrap(), (5, 3));
        assert_eq!(&buf[HEADER_LEN..], record.pixels());
        assert_eq!(RawImageRecord::read_from(&mut Cursor::new(&buf)).unwrap(), record);
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(RawImageRecord::new(2, 2, vec![0; 11]).is_err());
        assert!(RawImageRecord::new(2, 2, vec![0; 13]).is_err());
        assert!(RawImageRecord::new(0, 0, vec![]).is_ok());
    }

    #[test]
    fn test_read_truncated() {
        let mut buf = vec![];
        gradient(4, 4).write_to(&mut buf).unwrap();

        assert!(RawImageRecord::read_from(&mut Cursor::new(&buf[..6])).is_err());
        assert!(RawImageRecord::read_from(&mut Cursor::new(&buf[..buf.len() - 1])).is_err());
    }

    #[test]
    fn test_read_huge_header_without_data() {
        let header = [0xFF, 0xFF, 0xFF, 0xFF, 0x55, 0x55, 0x55, 0x55];
        assert!(RawImageRecord::read_from(&mut Cursor::new(header)).is_err());

        let mut buf = vec![];
        buf.extend_from_slice(&60000u32.to_le_bytes());
        buf.extend_from_slice(&60000u32.to_le_bytes());
        buf.extend_from_slice(&[0; 100]);
        assert!(RawImageRecord::read_from(&mut Cursor::new(buf)).is_err());
    }

    #[test]
    fn test_read_trailing_bytes() {
        let mut buf = vec![];
        gradient(4, 4).write_to(&mut buf).unwrap();
        buf.push(0);

        assert!(RawImageRecord::read_from(&mut Cursor::new(&buf)).is_err());
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.img");
        let record = gradient(7, 2);

        record.save(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), record.encoded_len() as u64);
        assert_eq!(RawImageRecord::open(&path).unwrap(), record);
    }

    #[test]
    fn test_rgb_image_conversion() {
        let record = gradient(3, 3);
        let image = record.to_rgb_image().unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [3, 4, 5]);
        assert_eq!(RawImageRecord::from(image), record);
    }
}
