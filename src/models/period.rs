use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 年代枚举
///
/// 每张源照片固定生成这六个年代的风格化图像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1950s")]
    Fifties,
    #[serde(rename = "1960s")]
    Sixties,
    #[serde(rename = "1970s")]
    Seventies,
    #[serde(rename = "1980s")]
    Eighties,
    #[serde(rename = "1990s")]
    Nineties,
    #[serde(rename = "2000s")]
    TwoThousands,
}

/// 别名表（统一小写后查找）
static PERIOD_ALIASES: phf::Map<&'static str, Period> = phf_map! {
    "1950s" => Period::Fifties,
    "1950" => Period::Fifties,
    "50s" => Period::Fifties,
    "1960s" => Period::Sixties,
    "1960" => Period::Sixties,
    "60s" => Period::Sixties,
    "1970s" => Period::Seventies,
    "1970" => Period::Seventies,
    "70s" => Period::Seventies,
    "1980s" => Period::Eighties,
    "1980" => Period::Eighties,
    "80s" => Period::Eighties,
    "1990s" => Period::Nineties,
    "1990" => Period::Nineties,
    "90s" => Period::Nineties,
    "2000s" => Period::TwoThousands,
    "2000" => Period::TwoThousands,
    "00s" => Period::TwoThousands,
};

impl Period {
    /// 全部年代，按时间顺序
    pub const ALL: [Period; 6] = [
        Period::Fifties,
        Period::Sixties,
        Period::Seventies,
        Period::Eighties,
        Period::Nineties,
        Period::TwoThousands,
    ];

    /// 获取标准名称
    pub fn label(self) -> &'static str {
        match self {
            Period::Fifties => "1950s",
            Period::Sixties => "1960s",
            Period::Seventies => "1970s",
            Period::Eighties => "1980s",
            Period::Nineties => "1990s",
            Period::TwoThousands => "2000s",
        }
    }

    /// 该年代的生成提示词
    pub fn prompt(self) -> String {
        format!(
            "Reimagine the person in this photo in the style of the {}. This includes clothing, \
             hairstyle, photo quality, and the overall aesthetic of that decade. The output must \
             be a photorealistic image showing the person clearly.",
            self.label()
        )
    }

    /// 主提示词没有产出图像时使用的备用提示词
    pub fn fallback_prompt(self) -> String {
        format!(
            "Create a photograph of the person in this image as if they were living in the {}. \
             The photograph should capture the distinct fashion, hairstyles, and overall \
             atmosphere of that time period. Ensure the final image is a clear photograph that \
             looks authentic to the era.",
            self.label()
        )
    }

    /// 从字符串解析年代（忽略大小写和首尾空白）
    pub fn from_str(s: &str) -> Option<Self> {
        PERIOD_ALIASES.get(s.trim().to_lowercase().as_str()).copied()
    }

    /// 在一段文本（例如提示词）中查找提到的年代
    pub fn find_in(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|period| text.contains(period.label()))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
