use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneCategory {
    Arm,
    Leg,
    Spine,
    Head,
    Hip,
    #[default]
    Other,
}

/// Keyword rules evaluated in order, first match wins
pub const CATEGORY_RULES: &[(&[&str], BoneCategory)] = &[
    (&["arm", "hand", "finger", "thumb"], BoneCategory::Arm),
    (&["leg", "foot", "toe"], BoneCategory::Leg),
    (&["spine", "neck"], BoneCategory::Spine),
    (&["head", "face", "jaw"], BoneCategory::Head),
    (&["hip", "pelvis"], BoneCategory::Hip),
];

impl BoneCategory {
    pub fn classify(bone_name: &str) -> Self {
        let name = bone_name.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| name.contains(keyword)))
            .map(|(_, category)| *category)
            .unwrap_or_default()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BoneCategory::Arm => "arm",
            BoneCategory::Leg => "leg",
            BoneCategory::Spine => "spine",
            BoneCategory::Head => "head",
            BoneCategory::Hip => "hip",
            BoneCategory::Other => "other",
        }
    }
}
