use crate::playback::{CoverImage, closest_cover};

fn cover(url: &str, width: u32) -> CoverImage {
    CoverImage {
        url: url.to_string(),
        width: Some(width),
        height: Some(width),
    }
}

/// **VALUE**: Verifies the smallest cover that is still wide enough is chosen.
///
/// **WHY THIS MATTERS**: The device has a small screen and a slow link; sending the
/// 640px cover wastes bandwidth, sending the 64px one looks blurry.
#[test]
fn given_several_covers_when_closest_cover_called_then_picks_smallest_sufficient() {
    // GIVEN: Spotify's usual three sizes, unordered
    let covers = vec![cover("large", 640), cover("small", 64), cover("medium", 300)];

    // WHEN: Asking for 300px
    let chosen = closest_cover(&covers, 300);

    // THEN: The 300px one
    assert_eq!(chosen.map(|c| c.url.as_str()), Some("medium"));
}

#[test]
fn given_only_small_covers_when_closest_cover_called_then_falls_back_to_first() {
    // GIVEN: Nothing wide enough
    let covers = vec![cover("first", 64), cover("second", 120)];

    // WHEN / THEN: First listed cover
    assert_eq!(
        closest_cover(&covers, 300).map(|c| c.url.as_str()),
        Some("first")
    );
}

#[test]
fn given_no_covers_when_closest_cover_called_then_none() {
    assert!(closest_cover(&[], 300).is_none());
}
