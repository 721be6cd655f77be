//! 17キーポイント配列（MoveNet並び）の既定の骨格定義。
//! エンドポイントがconnectionsを省略し、キーポイントが17点ちょうど
//! のときだけ使う。それ以外はエンドポイントの接続定義に従う。

pub const DEFAULT_KEYPOINT_COUNT: usize = 17;

/// 骨格の接続 (開始インデックス, 終了インデックス)
pub const DEFAULT_CONNECTIONS: [(usize, usize); 16] = [
    // 顔
    (3, 1),
    (1, 0),
    (0, 2),
    (2, 4),
    // 上半身
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    // 胴体
    (5, 11),
    (6, 12),
    (11, 12),
    // 下半身
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
];

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0x00FF00; // 緑

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFFFF00; // 黄色

/// 三分割グリッドの色 (RGB)
pub const GRID_COLOR: u32 = 0x555555;

/// 信頼度バーの色
pub const BAR_HIGH: u32 = 0x00CC44;
pub const BAR_MID: u32 = 0xFFCC00;
pub const BAR_LOW: u32 = 0xFF3333;
pub const BAR_BACKGROUND: u32 = 0x202020;
