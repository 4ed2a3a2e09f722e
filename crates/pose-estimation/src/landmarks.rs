use serde::{Deserialize, Serialize};

/// Number of landmarks in a full-body pose
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Full-body pose landmark names (33 landmarks, index order of the pose model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseLandmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl PoseLandmark {
    pub const ALL: [PoseLandmark; POSE_LANDMARK_COUNT] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftEyeInner,
        PoseLandmark::LeftEye,
        PoseLandmark::LeftEyeOuter,
        PoseLandmark::RightEyeInner,
        PoseLandmark::RightEye,
        PoseLandmark::RightEyeOuter,
        PoseLandmark::LeftEar,
        PoseLandmark::RightEar,
        PoseLandmark::MouthLeft,
        PoseLandmark::MouthRight,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftPinky,
        PoseLandmark::RightPinky,
        PoseLandmark::LeftIndex,
        PoseLandmark::RightIndex,
        PoseLandmark::LeftThumb,
        PoseLandmark::RightThumb,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftKnee,
        PoseLandmark::RightKnee,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
        PoseLandmark::LeftHeel,
        PoseLandmark::RightHeel,
        PoseLandmark::LeftFootIndex,
        PoseLandmark::RightFootIndex,
    ];

    /// Position of this landmark in a keypoint set
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get landmark from index (0-32)
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Get human-readable name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PoseLandmark::Nose => "nose",
            PoseLandmark::LeftEyeInner => "left_eye_inner",
            PoseLandmark::LeftEye => "left_eye",
            PoseLandmark::LeftEyeOuter => "left_eye_outer",
            PoseLandmark::RightEyeInner => "right_eye_inner",
            PoseLandmark::RightEye => "right_eye",
            PoseLandmark::RightEyeOuter => "right_eye_outer",
            PoseLandmark::LeftEar => "left_ear",
            PoseLandmark::RightEar => "right_ear",
            PoseLandmark::MouthLeft => "mouth_left",
            PoseLandmark::MouthRight => "mouth_right",
            PoseLandmark::LeftShoulder => "left_shoulder",
            PoseLandmark::RightShoulder => "right_shoulder",
            PoseLandmark::LeftElbow => "left_elbow",
            PoseLandmark::RightElbow => "right_elbow",
            PoseLandmark::LeftWrist => "left_wrist",
            PoseLandmark::RightWrist => "right_wrist",
            PoseLandmark::LeftPinky => "left_pinky",
            PoseLandmark::RightPinky => "right_pinky",
            PoseLandmark::LeftIndex => "left_index",
            PoseLandmark::RightIndex => "right_index",
            PoseLandmark::LeftThumb => "left_thumb",
            PoseLandmark::RightThumb => "right_thumb",
            PoseLandmark::LeftHip => "left_hip",
            PoseLandmark::RightHip => "right_hip",
            PoseLandmark::LeftKnee => "left_knee",
            PoseLandmark::RightKnee => "right_knee",
            PoseLandmark::LeftAnkle => "left_ankle",
            PoseLandmark::RightAnkle => "right_ankle",
            PoseLandmark::LeftHeel => "left_heel",
            PoseLandmark::RightHeel => "right_heel",
            PoseLandmark::LeftFootIndex => "left_foot_index",
            PoseLandmark::RightFootIndex => "right_foot_index",
        }
    }
}
