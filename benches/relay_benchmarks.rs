//! Progress relay performance benchmarks

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::ffi::CString;
use std::hint::black_box;
use std::os::raw::c_char;
use std::ptr;
use vpnbridge::relay;

fn emit_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_emit");

    group.bench_function("emit_without_sink", |b| {
        relay::clear_sink();
        b.iter(|| {
            relay::emit(
                ptr::null_mut(),
                relay::LEVEL_DEBUG,
                format_args!("poll cycle {} finished", black_box(42)),
            );
        });
    });

    group.bench_function("emit_with_sink", |b| {
        relay::set_sink(|_context, _level, message| {
            black_box(message.len());
        });
        b.iter(|| {
            relay::emit(
                ptr::null_mut(),
                relay::LEVEL_DEBUG,
                format_args!("poll cycle {} finished\n", black_box(42)),
            );
        });
        relay::clear_sink();
    });

    group.finish();
}

fn truncation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_truncation");

    let long_message = "x".repeat(2048);
    group.throughput(Throughput::Bytes(long_message.len() as u64));
    group.bench_function("emit_truncated", |b| {
        relay::set_sink(|_context, _level, message| {
            black_box(message.len());
        });
        b.iter(|| {
            relay::emit(
                ptr::null_mut(),
                relay::LEVEL_TRACE,
                format_args!("{}", black_box(&long_message)),
            );
        });
        relay::clear_sink();
    });

    group.finish();
}

fn configure_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ffi_configure");

    let config_cstr = CString::new(
        "[relay]\nmessage_capacity = 512\nmin_level = 3\nforward_empty = true\n",
    )
    .unwrap();
    let mut error_buffer = vec![0u8; 256];

    group.bench_function("configure_via_ffi", |b| {
        b.iter(|| {
            let result = unsafe {
                vpnbridge::ffi::vpnbridge_configure(
                    black_box(config_cstr.as_ptr()),
                    black_box(error_buffer.as_mut_ptr() as *mut c_char),
                    black_box(error_buffer.len()),
                )
            };
            let _ = black_box(result);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    emit_benchmark,
    truncation_benchmark,
    configure_benchmark
);
criterion_main!(benches);
