//! MSGF slot pool: rotation, bounded queue, truncating pop.

use hudlink_device::{DeviceError, FrameReceiver, MsgfConfig, MsgfReceiver};
use hudlink_proto::{FrameHeader, MAGIC_MSGF};

fn header(len: usize, seq: u32) -> FrameHeader {
    FrameHeader::new(MAGIC_MSGF, len as u32, 0, seq)
}

fn deliver(receiver: &MsgfReceiver, payload: &[u8], seq: u32) -> bool {
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
fn construction_bounds_are_enforced() {
    assert!(matches!(
        MsgfReceiver::new(MsgfConfig {
            max_msg_bytes: 8,
            ..MsgfConfig::default()
        }),
        Err(DeviceError::InvalidConfig(_))
    ));
    assert!(matches!(
        MsgfReceiver::new(MsgfConfig {
            queue_depth: 1,
            ..MsgfConfig::default()
        }),
        Err(DeviceError::InvalidConfig(_))
    ));
}

#[test]
fn messages_pop_in_fifo_order() {
    let receiver = MsgfReceiver::new(MsgfConfig::default()).unwrap();
    for seq in 1..=3u32 {
        let payload = [seq as u8; 5];
        assert!(deliver(&receiver, &payload, seq));
    }

    let mut buf = [0u8; 16];
    for seq in 1..=3u32 {
        let (len, got_seq) = receiver.pop(&mut buf).expect("message missing");
        assert_eq!((len, got_seq), (5, seq));
        assert_eq!(&buf[..5], &[seq as u8; 5]);
    }
    assert!(receiver.pop(&mut buf).is_none());
    assert_eq!(receiver.stats().frames_ok, 3);
}

#[test]
fn full_queue_drops_the_new_frame() {
    let receiver = MsgfReceiver::new(MsgfConfig {
        queue_depth: 2,
        ..MsgfConfig::default()
    })
    .unwrap();
    assert!(deliver(&receiver, &[1u8; 4], 1));
    assert!(deliver(&receiver, &[2u8; 4], 2));
    assert!(!deliver(&receiver, &[3u8; 4], 3));
    assert_eq!(receiver.stats().frames_drop, 1);

    // draining frees the queue for new frames
    let mut buf = [0u8; 16];
    assert_eq!(receiver.pop(&mut buf), Some((4, 1)));
    assert!(deliver(&receiver, &[4u8; 4], 4));
}

#[test]
fn pool_rotation_wraps_around() {
    let receiver = MsgfReceiver::new(MsgfConfig {
        queue_depth: 2,
        ..MsgfConfig::default()
    })
    .unwrap();
    let mut buf = [0u8; 16];
    // push/pop more messages than the pool has slots
    for seq in 1..=6u32 {
        assert!(deliver(&receiver, &[seq as u8; 3], seq));
        assert_eq!(receiver.pop(&mut buf), Some((3, seq)));
        assert_eq!(&buf[..3], &[seq as u8; 3]);
    }
}

#[test]
fn pop_truncates_to_the_destination() {
    let receiver = MsgfReceiver::new(MsgfConfig::default()).unwrap();
    let payload: Vec<u8> = (0..10).collect();
    assert!(deliver(&receiver, &payload, 9));

    let mut small = [0u8; 4];
    assert_eq!(receiver.pop(&mut small), Some((4, 9)));
    assert_eq!(&small, &[0, 1, 2, 3]);

    let mut empty = [0u8; 0];
    assert!(receiver.pop(&mut empty).is_none());
}
