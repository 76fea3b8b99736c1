//! Cross-word stream format tests: tag disjointness and decode dispatch.

use ipr_words::{is_tile_word, BoundsWord, ObjectWord, TileWord};

/// Every possible object word must be distinguishable from every tile word
/// by bit 31 alone.
#[test]
fn test_tag_bit_partitions_stream_words() {
    let tile = TileWord::new(0x7F, true, 0x7FF, 0x7FF);
    let object = ObjectWord::new(ObjectWord::ADDR_MASK, ObjectWord::MAX_PLANES)
        .with_begin()
        .with_flush()
        .with_last();
    assert!(is_tile_word(tile.to_raw()));
    assert!(!is_tile_word(object.to_raw()));
}

#[test]
fn test_sentinel_is_tile_word() {
    assert!(is_tile_word(TileWord::sentinel().to_raw()));
}

/// A consumer walking a raw stream dispatches on bit 31 and decodes the
/// logical fields back exactly.
#[test]
fn test_stream_decode_dispatch() {
    let words: [u32; 3] = [
        TileWord::new(1, false, 32, 32).to_raw(),
        ObjectWord::new(100, 3).to_raw(),
        ObjectWord::new(7, 1).with_flush().with_last().to_raw(),
    ];

    assert!(is_tile_word(words[0]));
    let tile = TileWord::from_raw(words[0]);
    assert_eq!(tile.x_pos(), 1);
    assert_eq!(tile.y_pos(), 32);
    assert_eq!(tile.y_size(), 32);

    assert!(!is_tile_word(words[1]));
    let obj = ObjectWord::from_raw(words[1]);
    assert_eq!(obj.addr(), 100);
    assert_eq!(obj.planes(), 3);
    assert!(!obj.last());

    let tail = ObjectWord::from_raw(words[2]);
    assert!(tail.flush());
    assert!(tail.last());
}

/// Bounds words are input-side only and never appear in the stream, but
/// their row units must survive the full 9-bit range.
#[test]
fn test_bounds_extremes() {
    let b = BoundsWord::new(0, 0, 0x7F, 0x1FF);
    assert_eq!(b.decode(), (0, 0, 0x7F, 0x1FF));
}
