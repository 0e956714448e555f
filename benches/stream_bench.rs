//! ALAC 流式编解码性能基准测试.
//!
//! 覆盖分帧编码、重组解码两条路径, 以及小块输入下的记账开销.

use alac_stream::codec::{AlacDecoder, AlacEncoder, DecodingDeframer, EncodingFramer};
use alac_stream::core::{BitDepth, StreamParams};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

/// 1 秒 44.1kHz 立体声 16 位 PCM
fn make_pcm() -> Vec<u8> {
    (0..44100u32 * 2)
        .flat_map(|i| (((i % 512) as i16 - 256) * 64).to_le_bytes())
        .collect()
}

fn params() -> StreamParams {
    StreamParams::new(44100, 2, BitDepth::S16, 4096).unwrap()
}

fn encode(pcm: &[u8], chunk_size: usize) -> (Vec<u8>, Vec<u32>, Vec<u8>) {
    let params = params();
    let mut framer = EncodingFramer::new(params, AlacEncoder::create(&params).unwrap());
    let mut out = Vec::with_capacity(pcm.len() + 1024);
    for chunk in pcm.chunks(chunk_size) {
        for packet in framer.feed(chunk).unwrap() {
            out.extend_from_slice(&packet.data);
        }
    }
    if let Some(packet) = framer.finish().unwrap() {
        out.extend_from_slice(&packet.data);
    }
    (
        out,
        framer.packet_table().to_vec(),
        framer.magic_cookie().to_vec(),
    )
}

fn bench_encode(c: &mut Criterion) {
    let pcm = make_pcm();
    let mut group = c.benchmark_group("framer_encode");
    group.throughput(Throughput::Bytes(pcm.len() as u64));
    for chunk_size in [512usize, 65536] {
        group.bench_function(format!("s16_stereo_chunk_{chunk_size}"), |b| {
            b.iter(|| encode(black_box(&pcm), chunk_size));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let pcm = make_pcm();
    let (compressed, table, cookie) = encode(&pcm, 65536);
    let params = params();

    let mut group = c.benchmark_group("deframer_decode");
    group.throughput(Throughput::Bytes(pcm.len() as u64));
    for chunk_size in [333usize, 65536] {
        group.bench_function(format!("s16_stereo_chunk_{chunk_size}"), |b| {
            b.iter(|| {
                let mut deframer =
                    DecodingDeframer::new(params, AlacDecoder::create(&params, &cookie).unwrap());
                deframer
                    .register_packet_lengths(table.iter().copied())
                    .unwrap();
                let mut total = 0usize;
                for chunk in black_box(&compressed).chunks(chunk_size) {
                    for frame in deframer.feed(chunk).unwrap() {
                        total += frame.len();
                    }
                }
                deframer.finish().unwrap();
                total
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
