//! Gesture classification from hand landmarks.
//!
//! The external detector yields, per frame, zero or more hands as ordered
//! landmark lists in image coordinates (y grows downward). Classification is
//! pure: count the raised fingers and look the count up in a fixed table.

use serde::{Deserialize, Serialize};

use kart_messages::Command;

/// One landmark position from the external hand detector.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// All landmarks of one detected hand, in the detector's canonical order.
pub type Hand = Vec<Landmark>;

// Detector indices of the four countable fingertips; each finger's middle
// joint sits two indices earlier. The thumb folds sideways rather than down
// and is never evaluated.
const FINGERTIP_INDICES: [usize; 4] = [8, 12, 16, 20];
const LANDMARKS_PER_HAND: usize = 21;

/// Number of raised fingers on one hand, thumb excluded.
///
/// A finger counts as raised when its tip sits strictly above its middle
/// joint. A hand with fewer landmarks than the detector's full set counts
/// as zero raised fingers.
pub fn count_raised_fingers(hand: &[Landmark]) -> usize {
    if hand.len() < LANDMARKS_PER_HAND {
        return 0;
    }
    FINGERTIP_INDICES
        .iter()
        .filter(|&&tip| hand[tip].y < hand[tip - 2].y)
        .count()
}

/// Map the detector's output for one frame to a drive command.
///
/// Only the first detected hand is considered, so the result never depends
/// on detector iteration order. No hand, or a finger count outside 1..=4,
/// maps to [`Command::Stop`].
pub fn classify(hands: &[Hand]) -> Command {
    let Some(hand) = hands.first() else {
        return Command::Stop;
    };
    match count_raised_fingers(hand) {
        1 => Command::Forward,
        2 => Command::Backward,
        3 => Command::Left,
        4 => Command::Right,
        _ => Command::Stop,
    }
}
