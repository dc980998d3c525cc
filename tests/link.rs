//! End to end: sender session → byte stream → frame decoder → payload decoder.

use std::f32::consts::PI;

use imu_frame_link::*;

struct ScriptedImu {
    fail:    Option<StatusEvent>,
    samples: Vec<Sample>,
}

impl SampleSource for ScriptedImu {
    fn init_stage(&mut self, stage: StatusEvent) -> u8 {
        if self.fail == Some(stage) { 0x07 } else { STATUS_OK }
    }

    fn read(&mut self) -> Reading {
        match self.samples.pop() {
            Some(sample) => Reading::Sample(sample),
            None => Reading::Overflow,
        }
    }
}

fn decode_all(stream: &[u8]) -> Vec<Message> {
    FrameDecoder::filter_buffer(stream)
        .frames()
        .map(|payload| Message::decode(payload, FloatOrder::Big).unwrap())
        .collect()
}

#[test]
fn status_frame_scenario() {
    let frame = report_status(1, 0);
    let [hi, lo] = checksum(&[0x01, 0x00]).to_be_bytes();
    assert_eq!(frame.as_bytes(), &[0x3A, 0x02, 0x01, 0x00, hi, lo, 0x0A]);
}

#[test]
fn receiver_recomputes_transmitted_checksum() {
    for len in 0..=255usize {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
        let frame = build_frame(&payload).unwrap();
        let bytes = frame.as_bytes();

        let n = bytes[1] as usize;
        let extracted = &bytes[2..2 + n];
        let carried = u16::from_be_bytes([bytes[2 + n], bytes[3 + n]]);

        assert_eq!(checksum(extracted), carried);
        assert_eq!(FrameDecoder::filter_buffer(bytes).frames().count(), 1);
    }
}

#[test]
fn session_stream_decodes() {
    let fields = FieldConfig::from_fields(&[Field::Euler, Field::WorldAccel]);
    let encoder = FrameEncoder::new(FieldSelector::new(fields)).unwrap();
    let mut sender = Sender::new(Vec::new(), encoder, InitPolicy::HaltOnFailure);

    let sample = Sample {
        euler: [PI, -PI / 2.0, 0.0],
        world_accel: [0.5, -0.5, 1.0],
        ..Default::default()
    };
    let mut imu = ScriptedImu {
        fail:    None,
        samples: vec![sample],
    };
    let ready = DataReady::new();

    assert_eq!(sender.initialize(&mut imu).unwrap(), SenderState::Streaming);
    for _ in 0..2 {
        ready.signal();
        assert!(sender.poll(&mut imu, &ready).unwrap());
    }

    let messages = decode_all(sender.get_ref());
    assert_eq!(messages.len(), 6);

    let Message::Telemetry(t) = &messages[4] else {
        panic!("expected telemetry, got {:?}", messages[4]);
    };
    assert_eq!(t.type_mask, 0x12);
    let [psi, theta, _] = t.euler.unwrap();
    assert!((psi - 180.0).abs() < 1e-5);
    assert!((theta + 90.0).abs() < 1e-5);
    assert_eq!(t.world_accel, Some([0.5, -0.5, 1.0]));
    assert!(t.quaternion.is_none());

    assert_eq!(
        messages[5],
        Message::Status(StatusReport {
            event: StatusEvent::FifoOverflow,
            code:  STATUS_FAILURE,
        })
    );
}

#[test]
fn report_and_continue_still_streams() {
    let encoder = FrameEncoder::new(FieldSelector::new(FieldConfig::NONE)).unwrap();
    let mut sender = Sender::new(Vec::new(), encoder, InitPolicy::ReportAndContinue);
    let mut imu = ScriptedImu {
        fail:    Some(StatusEvent::Connection),
        samples: vec![Sample::default()],
    };

    assert_eq!(sender.initialize(&mut imu).unwrap(), SenderState::Streaming);
    sender.send_sample(&Sample::default()).unwrap();

    let messages = decode_all(sender.get_ref());
    let codes: Vec<_> = messages[..4]
        .iter()
        .map(|m| match m {
            Message::Status(r) => r.code,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(codes, vec![STATUS_OK, 0x07, STATUS_OK, STATUS_OK]);
    assert!(matches!(&messages[4], Message::Telemetry(t) if t.type_mask == 0));
}

#[test]
fn noisy_chunked_stream_resyncs() {
    let encoder = FrameEncoder::new(FieldSelector::new(FieldConfig::ALL)).unwrap();
    let sample = Sample {
        quaternion: [0.0, 1.0, 0.0, 0.0],
        ..Default::default()
    };

    let mut wire = b"DMP ready: yes\r\n".to_vec();
    wire.extend_from_slice(encoder.encode_sample(&sample).as_bytes());
    let mut damaged = encoder.encode_sample(&sample).as_bytes().to_vec();
    damaged[10] ^= 0x01;
    wire.extend_from_slice(&damaged);
    wire.extend_from_slice(report_status(4, 0xFF).as_bytes());
    wire.extend_from_slice(encoder.encode_sample(&sample).as_bytes());

    // Feed in small chunks and drain like a serial reader does
    let mut buffer = Vec::new();
    let mut frames = Vec::new();
    let mut corrupt = 0;
    let mut text = Vec::new();
    for chunk in wire.chunks(7) {
        buffer.extend_from_slice(chunk);
        let result = FrameDecoder::filter_buffer(&buffer);
        for segment in &result.segments {
            match segment {
                Segment::Frame(p) => frames.push(p.to_vec()),
                Segment::Corrupt { .. } => corrupt += 1,
                Segment::Text(t) => text.extend_from_slice(t),
            }
        }
        let trim = result.trim_index;
        buffer.drain(..trim);
    }

    assert_eq!(corrupt, 1);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1], vec![0x04, 0xFF]);
    // The damaged frame's bytes are rescanned after its marker and surface as text
    let mut expected_text = b"DMP ready: yes\r\n".to_vec();
    expected_text.extend_from_slice(&damaged);
    assert_eq!(text, expected_text);
    assert!(buffer.is_empty());

    let Message::Telemetry(t) = Message::decode(&frames[2], FloatOrder::Big).unwrap() else {
        panic!("expected telemetry");
    };
    assert_eq!(t.quaternion, Some([0.0, 1.0, 0.0, 0.0]));
}

#[test]
fn oversized_payload_is_an_error() {
    assert!(matches!(
        build_frame(&[0u8; 300]),
        Err(FrameError::PayloadTooLarge { size: 300, max: 255 })
    ));
}
