//! Literal byte fixtures and round-trips for the frame encoder.

mod common;

use common::*;

#[test]
fn snapshot_frame_layout() {
    let frame = encode_msg_snapshot(&sample_snapshot(), 7, false);

    assert_eq!(frame.len(), 46);
    // magic "MSGF" on the wire
    assert_eq!(&frame[0..4], &[0x4D, 0x53, 0x47, 0x46]);
    // type/flags/rsv reserved zero
    assert_eq!(&frame[4..8], &[0, 0, 0, 0]);
    // len = 27 (command byte + 26-byte body)
    assert_eq!(&frame[8..12], &[0x1B, 0x00, 0x00, 0x00]);
    // crc disabled
    assert_eq!(&frame[12..16], &[0x00, 0x00, 0x00, 0x00]);
    // seq = 7
    assert_eq!(&frame[16..20], &[0x07, 0x00, 0x00, 0x00]);
    // command 0x00 = snapshot
    assert_eq!(frame[20], 0x00);
    // speed 80 km/h little-endian
    assert_eq!(&frame[21..23], &[0x50, 0x00]);
}

#[test]
fn reboot_frame_layout() {
    let frame = encode_msg_command(MsgCommand::Reboot, 1, false);

    assert_eq!(frame.len(), 21);
    assert_eq!(&frame[0..4], &[0x4D, 0x53, 0x47, 0x46]);
    assert_eq!(&frame[8..12], &[0x01, 0x00, 0x00, 0x00]);
    assert_eq!(frame[20], 0x01);
}

#[test]
fn img_frame_carries_payload_verbatim() {
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    let frame = encode_img_png(&png, 99, false);

    assert_eq!(frame.len(), FRAME_HEADER_SIZE + png.len());
    assert_eq!(&frame[0..4], &[0x49, 0x4D, 0x47, 0x46]);
    assert_eq!(&frame[FRAME_HEADER_SIZE..], &png[..]);
}

#[test]
fn header_round_trip() {
    let payloads: [&[u8]; 3] = [&[0x00], &[1, 2, 3, 4, 5], &[0xAA; 300]];
    for (i, payload) in payloads.iter().enumerate() {
        for &crc in &[false, true] {
            let seq = 1000 + i as u32;
            let encoded = encode_frame(MAGIC_MSGF, payload, seq, crc);
            let frame = Frame::try_from(encoded).expect("decode failed");

            assert_eq!(frame.magic(), MAGIC_MSGF);
            assert_eq!(frame.seq(), seq);
            assert_eq!(frame.header.len.get() as usize, payload.len());
            assert_eq!(&frame.payload[..], *payload);
            if crc {
                assert_eq!(frame.header.crc32.get(), crc32fast::hash(payload));
                frame.verify_crc().expect("crc must verify");
            } else {
                assert_eq!(frame.header.crc32.get(), 0);
            }
        }
    }
}

#[test]
fn decode_rejects_truncated_input() {
    let encoded = encode_frame(MAGIC_IMGF, &[1, 2, 3, 4], 5, true);

    let short_header = encoded.slice(0..10);
    assert!(matches!(
        Frame::try_from(short_header),
        Err(ProtoError::Truncated { .. })
    ));

    let short_payload = encoded.slice(0..encoded.len() - 2);
    assert!(matches!(
        Frame::try_from(short_payload),
        Err(ProtoError::LengthMismatch { header: 4, actual: 2 })
    ));
}

#[test]
fn crc_mismatch_is_detected() {
    let encoded = encode_frame(MAGIC_MSGF, &[9, 9, 9], 1, true);
    let mut bytes = encoded.to_vec();
    bytes[20] ^= 0xFF;
    let frame = Frame::try_from(Bytes::from(bytes)).unwrap();
    assert!(matches!(
        frame.verify_crc(),
        Err(ProtoError::CrcMismatch { .. })
    ));
}
