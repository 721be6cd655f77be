//! MJPEG (multipart/x-mixed-replace) のバイトストリームからJPEGフレームを
//! 切り出すデコーダ。
//!
//! 境界文字列やパートヘッダは解釈せず、JPEGのSOI(FFD8)/EOI(FFD9)マーカーで
//! フレーム境界を判定する。サーバーごとの境界形式の揺れに影響されない。

use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

pub struct MjpegFrameCodec {
    max_frame_bytes: usize,
}

impl MjpegFrameCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    if haystack.len() < 2 {
        return None;
    }
    (from..haystack.len() - 1).find(|&i| haystack[i] == marker[0] && haystack[i + 1] == marker[1])
}

impl Decoder for MjpegFrameCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        // SOIより前（境界行・パートヘッダ）は読み捨てる
        match find_marker(src, SOI, 0) {
            Some(0) => {}
            Some(start) => src.advance(start),
            None => {
                // マーカーがチャンク境界で割れる場合に備えて末尾の0xFFだけ残す
                let keep = if src.last() == Some(&0xFF) { 1 } else { 0 };
                let drop_len = src.len() - keep;
                src.advance(drop_len);
                return Ok(None);
            }
        }

        match find_marker(src, EOI, 2) {
            Some(end) => Ok(Some(src.split_to(end + 2).freeze())),
            None => {
                if src.len() > self.max_frame_bytes {
                    Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("mjpeg frame exceeds {} bytes", self.max_frame_bytes),
                    ))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
