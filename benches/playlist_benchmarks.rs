use anisource::extractors::playlist::{parse_master, videos_from_playlist};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn master_playlist(variants: usize) -> String {
    let mut body = String::from("#EXTM3U\n");
    body.push_str("#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"English\",LANGUAGE=\"en\",URI=\"subs/en.m3u8\"\n");
    for i in 0..variants {
        let height = 240 + i * 120;
        body.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{},CODECS=\"avc1.640028,mp4a.40.2\"\n{}/index.m3u8\n",
            (i + 1) * 800_000,
            height * 16 / 9,
            height,
            height
        ));
    }
    body
}

fn benchmark_master_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Master Playlist");

    for variants in [3usize, 8, 32] {
        let body = master_playlist(variants);
        group.bench_with_input(BenchmarkId::new("parse_master", variants), &body, |b, body| {
            b.iter(|| parse_master(black_box("https://cdn.example/hls/master.m3u8"), black_box(body)))
        });
        group.bench_with_input(BenchmarkId::new("videos_from_playlist", variants), &body, |b, body| {
            b.iter(|| {
                videos_from_playlist(
                    black_box("https://cdn.example/hls/master.m3u8"),
                    black_box(body),
                    "Filemoon - ",
                    Some("https://filemoon.sx/"),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_master_parsing);
criterion_main!(benches);
