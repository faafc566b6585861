use criterion::{Criterion, criterion_group, criterion_main};
use dbagent::format::render_aligned;
use dbagent::system::sampler::parse_iostat_output;
use std::hint::black_box;

fn host_rows() -> Vec<(&'static str, String)> {
    vec![
        ("OS", "linux".to_string()),
        ("Platform", "ubuntu-22.04".to_string()),
        ("Kernel", "5.15.0-91-generic".to_string()),
        ("Uptime", "1209600".to_string()),
        ("Total Processes", "412".to_string()),
        ("Load Avg", "2.37".to_string()),
        ("CPU", "Intel(R) Xeon(R) Platinum 8375C CPU @ 2.90GHz".to_string()),
        ("CPU Count", "32".to_string()),
        ("CPU Cores", "16".to_string()),
        ("CPU Mhz", "2900".to_string()),
        ("Total Memory(GB)", "124".to_string()),
        ("Free Memory(GB)", "37".to_string()),
        ("Used Memory(GB)", "81".to_string()),
    ]
}

fn bench_parse(c: &mut Criterion) {
    let line = "1532.40 876.10 23.94 11.37 87.52\n";
    c.bench_function("parse_iostat_output", |b| {
        b.iter(|| parse_iostat_output(black_box(line)))
    });
}

fn bench_render(c: &mut Criterion) {
    let rows = host_rows();
    c.bench_function("render_host_report", |b| {
        b.iter(|| render_aligned(black_box(&rows)))
    });
}

criterion_group!(benches, bench_parse, bench_render);
criterion_main!(benches);
