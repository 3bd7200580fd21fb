use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chara-ai")]
#[command(about = "キャラ画像の特徴タグ付け・好み分析・画像生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フォルダの画像を連番にリネームし、特徴を推定してタグストアを更新
    Tag {
        /// キャラ画像フォルダ（デフォルト: 設定の image_dir）
        #[arg(short, long)]
        image_dir: Option<PathBuf>,

        /// タグストアJSON（デフォルト: 設定の feature_file）
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// タグストアの画像一覧
    List {
        /// 登録済みの作品名を一覧表示
        #[arg(long, conflicts_with = "names")]
        works: bool,

        /// 登録済みのキャラ名を一覧表示
        #[arg(long)]
        names: bool,
    },

    /// 条件に一致するキャラを検索
    Search(SearchArgs),

    /// 特徴の割合を集計
    Stats {
        /// 作品名で絞り込み
        #[arg(short, long)]
        work: Option<String>,

        /// 集計する項目（省略時は全項目）
        #[arg(short, long)]
        field: Option<String>,
    },

    /// 特徴を1項目編集（空文字で未設定に戻す）
    Edit {
        /// 画像ファイル名（例: 001.png）
        id: String,

        /// 項目名（例: hair_color_main）
        field: String,

        /// 設定する値
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// 2枚ずつ提示される画像から好きな方を選ぶ
    Select {
        /// 前回の選択結果を破棄して最初から
        #[arg(long)]
        restart: bool,
    },

    /// 選択結果を削除
    Reset,

    /// 選択結果から好みの特徴を分析
    Analyze {
        /// 最小支持度
        #[arg(long, default_value = "0.25")]
        min_support: f64,

        /// 最小リフト値
        #[arg(long, default_value = "1.1")]
        min_lift: f64,

        /// 表示するルール数
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 画像を生成（プロンプト省略時は分析結果から作成）
    Generate {
        /// プロンプト
        #[arg(short, long)]
        prompt: Option<String>,

        /// 出力フォルダ（デフォルト: 設定の output_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定
    Config {
        /// 画像生成APIのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 特徴推定コマンドを設定（例: "python clip_classify.py"）
        #[arg(long)]
        set_classifier: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 検索条件（未指定は条件なし）
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub work: Option<String>,
    #[arg(long)]
    pub hair_length: Option<String>,
    #[arg(long)]
    pub hair_color_main: Option<String>,
    #[arg(long)]
    pub hair_color_sub: Option<String>,
    #[arg(long)]
    pub hairstyle_main: Option<String>,
    #[arg(long)]
    pub hairstyle_type: Option<String>,
    #[arg(long)]
    pub hairstyle_detail: Option<String>,
    #[arg(long)]
    pub eye_color: Option<String>,
    #[arg(long)]
    pub eye_shape: Option<String>,
    #[arg(long)]
    pub expression: Option<String>,
    #[arg(long)]
    pub vibe: Option<String>,
}

impl SearchArgs {
    pub fn to_filter(&self) -> chara_ai_common::TagFilter {
        use chara_ai_common::Field;

        let pairs = [
            (Field::Name, &self.name),
            (Field::Work, &self.work),
            (Field::HairLength, &self.hair_length),
            (Field::HairColorMain, &self.hair_color_main),
            (Field::HairColorSub, &self.hair_color_sub),
            (Field::HairstyleMain, &self.hairstyle_main),
            (Field::HairstyleType, &self.hairstyle_type),
            (Field::HairstyleDetail, &self.hairstyle_detail),
            (Field::EyeColor, &self.eye_color),
            (Field::EyeShape, &self.eye_shape),
            (Field::Expression, &self.expression),
            (Field::Vibe, &self.vibe),
        ];

        let mut filter = chara_ai_common::TagFilter::new();
        for (field, value) in pairs {
            if let Some(value) = value {
                filter.set(field, value.trim());
            }
        }
        filter
    }
}
