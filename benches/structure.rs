use criterion::{criterion_group, criterion_main, Criterion};

use mailscope::model::message::{BodyPart, LeafPart, Params};
use mailscope::parser::structure::find_attachments;

fn leaf(index: usize, attachment: bool) -> BodyPart {
    let mut params = Params::new();
    params.insert("filename".into(), format!("=?UTF-8?Q?file_{index}.pdf?="));
    BodyPart::Leaf(LeafPart {
        media_type: "application/pdf".into(),
        disposition: if attachment { "attachment" } else { "inline" }.into(),
        disposition_params: Some(params),
        size: 4096,
        ..Default::default()
    })
}

/// A `multipart/mixed` tree `depth` levels deep with `width` leaves per level.
fn tree(depth: usize, width: usize) -> BodyPart {
    let mut parts: Vec<BodyPart> = (0..width).map(|i| leaf(depth * width + i, i % 2 == 0)).collect();
    if depth > 0 {
        parts.push(tree(depth - 1, width));
    }
    BodyPart::Multipart {
        subtype: "mixed".into(),
        parts,
    }
}

fn bench_find_attachments(c: &mut Criterion) {
    let wide = tree(1, 200);
    let deep = tree(20, 5);

    c.bench_function("find_attachments_wide", |b| {
        b.iter(|| find_attachments(&wide).len())
    });
    c.bench_function("find_attachments_deep", |b| {
        b.iter(|| find_attachments(&deep).len())
    });
}

criterion_group!(benches, bench_find_attachments);
criterion_main!(benches);
