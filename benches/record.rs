use std::hint::black_box;
use std::io::Cursor;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};
use rawimg::RawImageRecord;
use rawimg::record::HEADER_LEN;

fn sample_jpg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
    let mut buf = Cursor::new(vec![]);
    image.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

fn jpeg_to_record(jpg: &[u8]) -> RawImageRecord {
    let image = image::load_from_memory_with_format(jpg, ImageFormat::Jpeg).unwrap().into_rgb8();
    RawImageRecord::from(image)
}

fn benchmark_record(c: &mut Criterion) {
    let jpg = sample_jpg(640, 480);
    let record = jpeg_to_record(&jpg);
    let mut encoded = Vec::with_capacity(record.encoded_len());
    record.write_to(&mut encoded).unwrap();

    let mut group = c.benchmark_group("原始图像记录");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("JPEG 解码", |b| b.iter(|| jpeg_to_record(black_box(&jpg))));
    group.bench_function("写入", |b| {
        b.iter(|| {
            let mut buf = Vec::with_capacity(HEADER_LEN + record.pixels().len());
            record.write_to(&mut buf).unwrap();
            buf
        })
    });
    group.bench_function("读取", |b| {
        b.iter(|| RawImageRecord::read_from(&mut Cursor::new(black_box(&encoded))).unwrap())
    });
    group.finish();
}

criterion_group!(benches, benchmark_record);
criterion_main!(benches);
