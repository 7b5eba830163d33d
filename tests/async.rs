use lzw12::{decode::Decoder, encode::Encoder, LzwError};
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};

#[tokio::test]
async fn async_roundtrip() {
    let data = "Peter Piper picked a peck of pickled peppers. ".repeat(300);
    let data = data.as_bytes();

    let mut compressed = vec![];
    let mut encoder = Encoder::new();
    let result = encoder
        .into_async((&mut compressed).compat_write())
        .encode_all(tokio::io::BufReader::new(data).compat())
        .await;
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert_eq!(compressed, lzw12::compress(data));

    let mut decompressed = vec![];
    let mut decoder = Decoder::new();
    let result = decoder
        .into_async((&mut decompressed).compat_write())
        .decode_all(tokio::io::BufReader::new(&compressed[..]).compat())
        .await;
    assert!(result.status.is_ok(), "{:?}", result.status);
    assert_eq!(result.bytes_written, data.len());
    assert_eq!(decompressed, data);
}

#[tokio::test]
async fn async_corrupt_stream() {
    let corrupt = lzw12::pack::pack(&[300, 1]);
    let mut sink = vec![];
    let mut decoder = Decoder::new();
    let result = decoder
        .into_async((&mut sink).compat_write())
        .decode_all(tokio::io::BufReader::new(&corrupt[..]).compat())
        .await;
    assert!(matches!(
        result.status,
        Err(LzwError::CorruptStream { code: 300, cursor: 256 })
    ));
}

#[tokio::test]
async fn async_output_before_corruption_is_kept() {
    let corrupt = lzw12::pack::pack(&[72, 105, 33, 4000]);
    let mut sink = vec![];
    let mut decoder = Decoder::new();
    let result = decoder
        .into_async((&mut sink).compat_write())
        .decode_all(tokio::io::BufReader::new(&corrupt[..]).compat())
        .await;
    assert!(result.status.is_err());
    assert_eq!(result.bytes_written, 3);
    assert_eq!(sink, b"Hi!");
}
