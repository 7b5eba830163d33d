use lzw12::decode::Decoder;
use lzw12::encode::Encoder;
use lzw12::{LzwError, LzwStatus};

fn encode_chunked(data: &[u8], in_chunk: usize, out_len: usize) -> Vec<u8> {
    let mut encoder = Encoder::new();
    let mut out = vec![0; out_len];
    let mut compressed = vec![];
    let mut inp = data;
    loop {
        if inp.is_empty() {
            encoder.finish();
        }
        let chunk = in_chunk.min(inp.len());
        let result = encoder.encode_bytes(&inp[..chunk], &mut out);
        inp = &inp[result.consumed_in..];
        compressed.extend_from_slice(&out[..result.consumed_out]);
        match result.status.unwrap() {
            LzwStatus::Done => break,
            LzwStatus::Ok => {}
            LzwStatus::NoProgress => panic!("Need to make progress"),
        }
    }
    compressed
}

fn decode_chunked(data: &[u8], in_chunk: usize, out_len: usize) -> Vec<u8> {
    let mut decoder = Decoder::new();
    let mut out = vec![0; out_len];
    let mut decompressed = vec![];
    let mut inp = data;
    loop {
        if inp.is_empty() {
            decoder.finish();
        }
        let chunk = in_chunk.min(inp.len());
        let result = decoder.decode_bytes(&inp[..chunk], &mut out);
        inp = &inp[result.consumed_in..];
        decompressed.extend_from_slice(&out[..result.consumed_out]);
        match result.status.unwrap() {
            LzwStatus::Done => break,
            LzwStatus::Ok => {}
            LzwStatus::NoProgress => panic!("Need to make progress"),
        }
    }
    decompressed
}

#[test]
fn tiny_buffers() {
    let data = "It was the best of times, it was the worst of times. ".repeat(40);
    let data = data.as_bytes();
    let reference = lzw12::compress(data);

    for &in_chunk in &[1, 2, 5, 64] {
        for out_len in 1..8 {
            let compressed = encode_chunked(data, in_chunk, out_len);
            assert_eq!(compressed, reference, "{} {}", in_chunk, out_len);

            let decompressed = decode_chunked(&compressed, in_chunk, out_len);
            assert!(decompressed == data, "{} {}", in_chunk, out_len);
        }
    }
}

#[test]
fn data_after_sentinel_is_ignored() {
    let mut compressed = lzw12::compress(b"odd");
    assert_eq!(compressed.len(), 6);
    compressed.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(decode_chunked(&compressed, 2, 3), b"odd");
}

#[test]
fn corrupt_code_is_reported() {
    // 'A', 'B' and then code 258 while the next free code is 257.
    let corrupt = lzw12::pack::pack(&[65, 66, 258, 65]);
    let mut out = vec![];
    let result = Decoder::new().into_vec(&mut out).decode_all(&corrupt);
    match result.status {
        Err(LzwError::CorruptStream { code, cursor }) => {
            assert_eq!(code, 258);
            assert_eq!(cursor, 257);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(out, b"AB");
}

#[test]
fn truncated_group_is_reported() {
    let mut compressed = lzw12::compress(b"four");
    compressed.truncate(compressed.len() - 2);
    assert!(matches!(
        lzw12::decompress(&compressed),
        Err(LzwError::TruncatedStream { trailing: 1 })
    ));
}

#[test]
fn output_before_corruption_is_kept() {
    // "Hi!" and then a code far past the next free code 258.
    let corrupt = lzw12::pack::pack(&[72, 105, 33, 4000]);

    let mut vec_out = vec![];
    let vec_result = Decoder::new().into_vec(&mut vec_out).decode_all(&corrupt);

    let mut stream_out = vec![];
    let stream_result = Decoder::new()
        .into_stream(&mut stream_out)
        .decode_all(&corrupt[..]);

    for status in &[vec_result.status, stream_result.status] {
        assert!(matches!(
            status,
            Err(LzwError::CorruptStream {
                code: 4000,
                cursor: 258
            })
        ));
    }
    assert_eq!(vec_out, b"Hi!");
    assert_eq!(stream_out, vec_out);
    assert_eq!(stream_result.bytes_written, stream_out.len());
}
