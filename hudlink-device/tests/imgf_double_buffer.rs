//! IMGF double-buffer protocol: slot states, drop policies, tokens.

use hudlink_device::{
    DeviceError, DropPolicy, DropReason, FrameReceiver, ImgfConfig, ImgfReceiver,
};
use hudlink_proto::{FrameHeader, MAGIC_IMGF};

fn header(len: usize, seq: u32) -> FrameHeader {
    FrameHeader::new(MAGIC_IMGF, len as u32, 0, seq)
}

/// Simulate the router delivering one complete frame.
fn deliver(receiver: &ImgfReceiver, payload: &[u8], seq: u32) -> bool {
    let hdr = header(payload.len(), seq);
    match receiver.acquire(&hdr) {
        Some(mut grant) => {
            grant.as_mut()[..payload.len()].copy_from_slice(payload);
            receiver.commit(&hdr, grant, payload.len());
            true
        }
        None => false,
    }
}

#[test]
fn construction_requires_a_sane_buffer_size() {
    let result = ImgfReceiver::new(ImgfConfig {
        max_png_bytes: 512,
        ..ImgfConfig::default()
    });
    assert!(matches!(result, Err(DeviceError::InvalidConfig(_))));
}

#[test]
fn single_frame_round_trip() {
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    let payload = vec![7u8; 4096];
    assert!(deliver(&receiver, &payload, 1));

    let ready = receiver.ready().expect("image not ready");
    assert_eq!(ready.png, &payload[..]);
    assert_eq!(ready.seq, 1);
    let token = ready.token;
    receiver.release(token);
    assert_eq!(receiver.stats().frames_ok, 1);
}

#[test]
fn drop_old_demotes_the_ready_slot_while_reading() {
    // the S5 scenario: A read by the consumer, B parked READY, C arrives
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    let a = vec![0xAAu8; 4096];
    let b = vec![0xBBu8; 4096];
    let c = vec![0xCCu8; 4096];

    assert!(deliver(&receiver, &a, 1));
    let reading = receiver.ready().expect("A not ready");
    assert_eq!(reading.png, &a[..]);

    assert!(deliver(&receiver, &b, 2));
    assert!(deliver(&receiver, &c, 3), "C must reuse B's slot");

    let stats = receiver.stats();
    assert_eq!(stats.frames_ok, 3);
    assert_eq!(stats.frames_drop, 1);

    // A is still intact while C replaced B
    assert_eq!(reading.png, &a[..]);
    let token = reading.token;
    receiver.release(token);
    let next = receiver.ready().expect("C not ready");
    assert_eq!(next.png, &c[..]);
    assert_eq!(next.seq, 3);
}

#[test]
fn drop_old_with_no_ready_slot_drops_the_new_frame() {
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    assert!(deliver(&receiver, &[1u8; 2048], 1));
    assert!(deliver(&receiver, &[2u8; 2048], 2));
    let first = receiver.ready().unwrap();
    let second = receiver.ready().unwrap();
    // both slots READING: nothing to demote
    assert!(!deliver(&receiver, &[3u8; 2048], 3));
    assert_eq!(receiver.stats().frames_drop, 1);
    let (t1, t2) = (first.token, second.token);
    receiver.release(t1);
    receiver.release(t2);
}

#[test]
fn drop_new_never_touches_parked_images() {
    let receiver = ImgfReceiver::new(ImgfConfig {
        drop_policy: DropPolicy::DropNew,
        ..ImgfConfig::default()
    })
    .unwrap();
    assert!(deliver(&receiver, &[1u8; 2048], 1));
    assert!(deliver(&receiver, &[2u8; 2048], 2));
    // both READY; the newcomer loses
    assert!(!deliver(&receiver, &[3u8; 2048], 3));
    assert_eq!(receiver.stats().frames_drop, 1);

    let ready = receiver.ready().unwrap();
    assert_eq!(ready.seq, 1, "slot 0 wins the tie");
}

#[test]
fn at_most_one_reading_and_one_writing_slot() {
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    assert!(deliver(&receiver, &[9u8; 1024], 1));
    let reading = receiver.ready().unwrap();

    // writer takes the other slot while the consumer reads
    let hdr = header(1024, 2);
    let grant = receiver.acquire(&hdr).expect("free slot expected");
    // with one READING and one WRITING there is nothing left to hand out
    assert!(receiver.acquire(&header(1024, 3)).is_none());
    receiver.abort(grant, DropReason::BadCrc);
    let token = reading.token;
    receiver.release(token);
}

#[test]
fn released_token_returns_only_after_a_new_commit() {
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    assert!(deliver(&receiver, &[5u8; 1024], 1));
    let ready = receiver.ready().unwrap();
    let token = ready.token;
    receiver.release(token);

    assert!(receiver.ready().is_none(), "released slot must not reappear");
    assert!(deliver(&receiver, &[6u8; 1024], 2));
    assert!(receiver.ready().is_some());
}

#[test]
fn abort_frees_the_writing_slot() {
    let receiver = ImgfReceiver::new(ImgfConfig::default()).unwrap();
    let grant = receiver.acquire(&header(1024, 1)).unwrap();
    receiver.abort(grant, DropReason::BadLen);
    assert_eq!(receiver.stats().frames_bad, 1);
    assert!(receiver.ready().is_none());
    // the slot is usable again
    assert!(deliver(&receiver, &[1u8; 1024], 2));
    assert!(receiver.ready().is_some());
}
