use lzw12::{decode, encode, pack};

#[test]
fn roundtrip_all() {
    let file = std::env::args().next().unwrap();
    let data = std::fs::read(file).unwrap();

    for &mask in &[0xff, 0x3f, 0x07] {
        let data: Vec<_> = data.iter().copied().map(|b| b & mask).collect();
        assert_roundtrips(&data);
    }
}

#[test]
fn split_input() {
    let data = "abracadabra, abracadabra! ".repeat(200);
    let data = data.as_bytes();

    let mut compressed = vec![];
    let mut encoder = encode::Encoder::new();
    for piece in data.chunks(7) {
        let mut into = encoder.into_vec(&mut compressed);
        assert!(into.encode(piece).status.is_ok());
    }
    assert!(encoder.into_vec(&mut compressed).encode_all(&[]).status.is_ok());
    assert_eq!(compressed, lzw12::compress(data));

    let mut decompressed = vec![];
    let mut decoder = decode::Decoder::new();
    for piece in compressed.chunks(5) {
        let mut into = decoder.into_vec(&mut decompressed);
        assert!(into.decode(piece).status.is_ok());
    }
    assert!(decoder.into_vec(&mut decompressed).decode_all(&[]).status.is_ok());
    assert_eq!(decompressed, data);
}

#[test]
fn codes_match_packing() {
    let data = b"ABABABAB";
    let codes = encode::CodeEncoder::new().encode_all(data);
    assert_eq!(codes, [65, 66, 256, 258, 66]);

    let packed = lzw12::compress(data);
    assert_eq!(packed, pack::pack(&codes));
    assert_eq!(pack::unpack(&packed).unwrap(), codes);
    assert_eq!(decode::CodeDecoder::new().decode_all(&codes).unwrap(), data);
}

fn assert_roundtrips(data: &[u8]) {
    let mut encoder = encode::Encoder::new();
    let mut buffer = Vec::with_capacity(2 * data.len() + 40);
    let result = encoder.into_vec(&mut buffer).encode_all(data);
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert_eq!(buffer.len() % 3, 0);

    let mut decoder = decode::Decoder::new();
    let mut compare = vec![];
    let result = decoder.into_vec(&mut compare).decode_all(buffer.as_slice());
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert!(data == &*compare);
}
