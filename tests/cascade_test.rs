use std::io;

use cascade_rs::{
    BoundingBox, BoxDecoder, CascadeConfig, CascadeError, CascadePipeline, ChannelOrder,
    ConstantClassifier, Frame, FrameLimit, FrameOutcome, FrameSink, FrameSource, InferenceEngine,
    LabelFont, ScriptedDetector, SnapshotSink, SyntheticSource, Verdict, Verifier, VerifierConfig,
    iou,
    non_max_suppression,
};
use ndarray::ArrayView4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_box(rng: &mut StdRng) -> BoundingBox {
    let xmin = rng.gen_range(0.0..0.9f32);
    let ymin = rng.gen_range(0.0..0.9f32);
    let w = rng.gen_range(0.0..0.4f32);
    let h = rng.gen_range(0.0..0.4f32);
    BoundingBox::new(xmin, ymin, xmin + w, ymin + h, rng.gen_range(0.0..1.0f32))
}

fn random_boxes(rng: &mut StdRng) -> Vec<BoundingBox> {
    let n = rng.gen_range(0..40);
    (0..n).map(|_| random_box(rng)).collect()
}

#[test]
fn test_iou_symmetric_and_bounded() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..2000 {
        let a = random_box(&mut rng);
        let b = random_box(&mut rng);
        let ab = iou(&a, &b);
        assert_eq!(ab, iou(&b, &a));
        assert!((0.0..=1.0).contains(&ab), "iou {ab} out of range");
        if a.area() > 0.0 {
            assert!((iou(&a, &a) - 1.0).abs() < 1e-5);
        }
    }
}

#[test]
fn test_nms_properties() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let input = random_boxes(&mut rng);
        let threshold = rng.gen_range(0.1..0.9f32);
        let output = non_max_suppression(input.clone(), threshold);

        // Subset
        assert!(output.len() <= input.len());
        for b in &output {
            assert!(input.contains(b));
        }

        // Overlap-free
        for (i, x) in output.iter().enumerate() {
            for y in &output[i + 1..] {
                assert!(x.iou(y) <= threshold);
            }
        }

        // Unique top candidate survives
        if let Some(top) = input
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        {
            let ties = input
                .iter()
                .filter(|b| b.confidence == top.confidence)
                .count();
            if ties == 1 {
                assert!(output.contains(top));
            }
        }

        // Every suppressed box overlaps an accepted box of at least its confidence
        for b in input.iter().filter(|b| !output.contains(*b)) {
            assert!(
                output
                    .iter()
                    .any(|a| a.confidence >= b.confidence && a.iou(b) > threshold)
            );
        }
    }
}

#[test]
fn test_nms_scenario_three_boxes() {
    let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0, 0.9);
    let b = BoundingBox::new(0.0, 0.0, 1.0, 0.9, 0.8);
    let c = BoundingBox::new(0.0, 0.0, 0.1, 1.0, 0.3);
    assert!((a.iou(&b) - 0.9).abs() < 1e-5);
    assert!(a.iou(&c) < 0.5 && b.iou(&c) < 0.5);

    let out = non_max_suppression(vec![c, a, b], 0.5);
    assert_eq!(out, vec![a, c]);
}

#[test]
fn test_nms_empty() {
    assert!(non_max_suppression(vec![], 0.5).is_empty());
}

#[test]
fn test_decoder_threshold_and_count_bound() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let count = rng.gen_range(0..20usize);
        let threshold = rng.gen_range(0.0..1.0f32);

        let mut scores: Vec<f32> = (0..count).map(|_| rng.gen_range(0.0..1.0)).collect();
        let mut boxes: Vec<f32> = (0..count * 4).map(|_| rng.gen_range(0.0..1.0)).collect();
        // Slots past `count` hold sentinels that must never be read.
        scores.extend([1.0; 5]);
        boxes.extend([7.0; 20]);

        let out = BoxDecoder::new(threshold)
            .decode(count, &scores, &boxes)
            .unwrap();
        let expected = scores[..count].iter().filter(|&&s| s >= threshold).count();
        assert_eq!(out.len(), expected);
        for b in &out {
            assert!(b.confidence >= threshold);
            assert!(b.xmin < 7.0 && b.ymax < 7.0);
        }
    }
}

#[test]
fn test_decoder_scenario() {
    let boxes = [
        0.0, 0.0, 0.1, 0.1, //
        0.2, 0.2, 0.3, 0.3, //
        0.4, 0.4, 0.5, 0.5,
    ];
    let out = BoxDecoder::new(0.4)
        .decode(3, &[0.9, 0.2, 0.5], &boxes)
        .unwrap();
    assert_eq!(
        out,
        vec![
            BoundingBox::from_yxyx([0.0, 0.0, 0.1, 0.1], 0.9),
            BoundingBox::from_yxyx([0.4, 0.4, 0.5, 0.5], 0.5),
        ]
    );
}

static ONE: [f32; 1] = [1.0];
static ZERO: [f32; 1] = [0.0];

struct CountingClassifier {
    invocations: usize,
}

impl InferenceEngine for CountingClassifier {
    type Error = std::convert::Infallible;

    fn set_input(&mut self, _input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        self.invocations += 1;
        Ok(())
    }

    fn output(&self, _index: usize) -> Option<&[f32]> {
        Some(&ONE[..])
    }
}

#[test]
fn test_degenerate_crop_rejected_without_classifier() {
    let mut verifier = Verifier::new(
        CountingClassifier { invocations: 0 },
        VerifierConfig::default(),
    );
    let frame = Frame::new(vec![0; 50 * 40 * 3], 50, 40, ChannelOrder::Rgb)
        .unwrap()
        .to_rgb()
        .unwrap();

    // Both x edges land past the right border and clamp to the same column.
    let candidate = BoundingBox::new(1.2, 0.1, 1.4, 0.9, 0.95);
    let verdict = verifier.verify(&frame, &candidate).unwrap();
    assert_eq!(verdict, Verdict::Degenerate);
    assert_eq!(verifier.engine().invocations, 0);
}

/// Reports zero detections and exposes no score/box outputs at all, so any
/// attempt to decode would fail.
struct EmptyDetector;

impl InferenceEngine for EmptyDetector {
    type Error = std::convert::Infallible;

    fn set_input(&mut self, _input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn output(&self, index: usize) -> Option<&[f32]> {
        (index == 2).then_some(&ZERO[..])
    }
}

#[derive(Default)]
struct RecordingSink {
    rendered: Vec<usize>,
    released: bool,
}

impl FrameSink for RecordingSink {
    fn render(
        &mut self,
        _frame: &Frame,
        detections: &[BoundingBox],
        _fps: f64,
    ) -> cascade_rs::Result<()> {
        self.rendered.push(detections.len());
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

struct TrackedSource {
    inner: SyntheticSource,
    released: bool,
}

impl FrameSource for TrackedSource {
    fn read_frame(&mut self) -> cascade_rs::Result<Frame> {
        self.inner.read_frame()
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[test]
fn test_zero_detections_skip_to_next_frame() {
    let mut pipeline =
        CascadePipeline::with_default_config(EmptyDetector, CountingClassifier { invocations: 0 })
            .unwrap();

    let mut source = SyntheticSource::new(32, 24);
    let frame = source.read_frame().unwrap();
    let report = pipeline.process_frame(&frame).unwrap();
    assert_eq!(report.outcome, FrameOutcome::NoDetections);
    assert!(report.detections.is_empty());
    assert_eq!(pipeline.metrics().frame_count(), 1);

    let report = pipeline.process_frame(&frame).unwrap();
    assert_eq!(report.outcome, FrameOutcome::NoDetections);
    assert_eq!(pipeline.metrics().frame_count(), 2);
    assert_eq!(pipeline.verifier().engine().invocations, 0);
}

#[test]
fn test_run_until_exit_signal() {
    let detector = ScriptedDetector::new(vec![
        vec![
            BoundingBox::new(0.1, 0.1, 0.5, 0.5, 0.9),
            BoundingBox::new(0.11, 0.11, 0.51, 0.51, 0.8),
        ],
        vec![],
    ]);
    let mut pipeline =
        CascadePipeline::with_default_config(detector, ConstantClassifier::new(0.9)).unwrap();

    let mut source = TrackedSource {
        inner: SyntheticSource::new(64, 48),
        released: false,
    };
    let mut sink = RecordingSink::default();
    let summary = pipeline
        .run(&mut source, &mut sink, &mut FrameLimit::new(4))
        .unwrap();

    assert_eq!(summary.frames, 4);
    assert_eq!(summary.verified, 2);
    assert_eq!(sink.rendered, vec![1, 0, 1, 0]);
    assert!(source.released);
    assert!(sink.released);
}

#[test]
fn test_stream_end_is_fatal_and_releases() {
    let mut pipeline = CascadePipeline::with_default_config(
        ScriptedDetector::new(vec![vec![]]),
        ConstantClassifier::new(0.9),
    )
    .unwrap();

    let mut source = TrackedSource {
        inner: SyntheticSource::new(16, 16).with_limit(2),
        released: false,
    };
    let mut sink = RecordingSink::default();
    let err = pipeline
        .run(&mut source, &mut sink, &mut FrameLimit::new(10))
        .unwrap_err();

    assert!(matches!(err, CascadeError::StreamEnded));
    assert_eq!(sink.rendered.len(), 2);
    assert!(source.released);
    assert!(sink.released);
}

struct FailingDetector;

impl InferenceEngine for FailingDetector {
    type Error = io::Error;

    fn set_input(&mut self, _input: ArrayView4<'_, f32>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), Self::Error> {
        Err(io::Error::other("interpreter invoke failed"))
    }

    fn output(&self, _index: usize) -> Option<&[f32]> {
        None
    }
}

#[test]
fn test_engine_failure_is_fatal() {
    let mut pipeline =
        CascadePipeline::with_default_config(FailingDetector, ConstantClassifier::new(0.9))
            .unwrap();
    let mut source = SyntheticSource::new(16, 16);
    let frame = source.read_frame().unwrap();

    let err = pipeline.process_frame(&frame).unwrap_err();
    assert!(matches!(err, CascadeError::Inference { stage: "detector", .. }));
    assert_eq!(pipeline.metrics().frame_count(), 0);
}

#[test]
fn test_config_file_round_trip_into_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cascade.toml");
    std::fs::write(
        &path,
        "[detector]\nconfidence_threshold = 0.6\n\n[verifier]\naccept_threshold = 0.5\n",
    )
    .unwrap();

    let config = CascadeConfig::load(&path).unwrap();
    assert_eq!(config.detector.confidence_threshold, 0.6);

    // 0.55 is below the detector threshold, 0.7 passes and the lowered
    // verifier threshold accepts the constant 0.6 classifier score.
    let detector = ScriptedDetector::new(vec![vec![
        BoundingBox::new(0.1, 0.1, 0.3, 0.3, 0.55),
        BoundingBox::new(0.6, 0.6, 0.9, 0.9, 0.7),
    ]]);
    let mut pipeline =
        CascadePipeline::new(detector, ConstantClassifier::new(0.6), &config).unwrap();
    let mut source = SyntheticSource::new(32, 32);
    let report = pipeline
        .process_frame(&source.read_frame().unwrap())
        .unwrap();
    assert_eq!(report.candidates, 1);
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].confidence, 0.7);
}

fn snapshot_bytes(detection: BoundingBox, fps: f64, font: LabelFont) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = SnapshotSink::new(dir.path(), 1).unwrap().with_font(font);
    let frame = SyntheticSource::new(64, 48).read_frame().unwrap();
    sink.render(&frame, &[detection], fps).unwrap();
    std::fs::read(dir.path().join("frame_000000.png")).unwrap()
}

#[test]
fn test_snapshot_overlay_tracks_score_and_fps() {
    if LabelFont::system().is_none() {
        eprintln!("no system font available, skipping snapshot overlay check");
        return;
    }
    let font = || LabelFont::system().unwrap();
    let weak = BoundingBox::new(0.2, 0.5, 0.8, 0.9, 0.31);
    let strong = BoundingBox {
        confidence: 0.99,
        ..weak
    };

    let base = snapshot_bytes(weak, 1.0, font());
    assert_ne!(base, snapshot_bytes(strong, 1.0, font()));
    assert_ne!(base, snapshot_bytes(weak, 250.0, font()));
    assert_eq!(base, snapshot_bytes(weak, 1.0, font()));
}
