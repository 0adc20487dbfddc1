use std::time::Duration;

use bitclock::{
    digit::{ConfigurationError, Digit},
    frame::{counter_from_elapsed, frame_slots, SLOT_OFFSETS},
    mesh::{build_digit_mesh, build_digit_mesh_from_value, Topology, SHRINK},
    mesh_cache::{MeshCache, MeshKey, MAX_CACHED_MESHES},
};

#[test]
fn one_minute_of_frames() {
    let mut cache = MeshCache::new();
    // Four frames per second over a minute, the counter wraps three times
    for quarter in 0..240u64 {
        let counter = counter_from_elapsed(Duration::from_millis(quarter * 250));
        assert_eq!(counter as u64, (quarter / 4) % 16);
        for slot in frame_slots(counter) {
            let expected = if (counter >> slot.bit) & 1 == 1 {
                Digit::One
            } else {
                Digit::Zero
            };
            assert_eq!(slot.digit, expected);
            let mesh = cache.get_or_insert_with(MeshKey::new(slot.digit, slot.bit), || {
                build_digit_mesh(slot.digit, slot.x_offset)
            });
            match slot.digit {
                Digit::One => {
                    assert_eq!(mesh.vertices.len(), 5);
                    assert_eq!(mesh.indices.len(), 9);
                    assert_eq!(mesh.topology, Topology::TriangleList);
                }
                Digit::Zero => {
                    assert_eq!(mesh.vertices.len(), 32);
                    assert_eq!(mesh.indices.len(), 34);
                    assert_eq!(mesh.topology, Topology::TriangleStrip);
                }
            }
        }
    }
    assert_eq!(cache.len(), MAX_CACHED_MESHES);
}

#[test]
fn most_significant_bit_is_at_positive_offset() {
    assert_eq!(SLOT_OFFSETS[3], 1.85);
    assert_eq!(SLOT_OFFSETS[0], -1.85);

    // Only bit 3 set, so the single "1" glyph sits right of center
    let slots = frame_slots(8);
    let ones = slots
        .iter()
        .filter(|s| s.digit == Digit::One)
        .collect::<Vec<_>>();
    assert_eq!(ones.len(), 1);
    let mesh = build_digit_mesh(ones[0].digit, ones[0].x_offset);
    let center = mesh.vertices[..4]
        .iter()
        .map(|v| v.position[0])
        .sum::<f32>()
        / 4.0;
    assert!((center - 1.85 * SHRINK).abs() < 1e-5);
}

#[test]
fn ten_shows_one_zero_one_zero() {
    let digits = frame_slots(10).map(|s| s.digit);
    assert_eq!(digits[3], Digit::One);
    assert_eq!(digits[2], Digit::Zero);
    assert_eq!(digits[1], Digit::One);
    assert_eq!(digits[0], Digit::Zero);
}

#[test]
fn out_of_range_digit_fails_fast() {
    for value in [2, 3, 255, u32::MAX] {
        assert_eq!(
            build_digit_mesh_from_value(value, 0.0),
            Err(ConfigurationError::InvalidDigit(value))
        );
    }
}
