use chara_ai_common::{apply_edit, filter_store, ratio_table, records_for_work, AnalysisOptions, Field};
use chara_ai_rust::{classifier, cli, config, error, generation, preference, session, storage, tagger};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{CharaAiError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Tag { image_dir, store } => {
            println!("🏷  chara-ai - 一括タグ付け\n");

            let image_dir = image_dir.unwrap_or_else(|| config.image_dir.clone());
            let store_path = store.unwrap_or_else(|| config.feature_file.clone());
            let classifier = classifier::CommandClassifier::from_command_line(&config.classifier_command)?;

            println!("[1/2] 特徴を推定中... ({})", image_dir.display());
            let report = tagger::run_tagging(&image_dir, &store_path, &classifier, true)?;
            println!("✔ {}枚を推定（新規 {}枚）\n", report.images, report.added);

            println!("[2/2] 連番リネーム・保存");
            println!("✔ {}枚をリネーム", report.renamed);
            println!("✔ タグストアを保存: {}", store_path.display());
            if report.renamed > 0 && storage::rekey_selections(&config.selected_file, &report.renames)? {
                println!("✔ 選択結果のファイル名を更新: {}", config.selected_file.display());
            }

            println!("\n✅ タグ付け完了");
        }

        Commands::List { works, names } => {
            let store = storage::load_store(&config.feature_file)?;
            let option_field = match (works, names) {
                (true, _) => Some(Field::Work),
                (_, true) => Some(Field::Name),
                _ => None,
            };

            match option_field {
                Some(field) => {
                    let values = store.distinct_values(field);
                    for value in &values {
                        println!("{}", value);
                    }
                    println!("\n{}: {}件", field.label(), values.len());
                }
                None => {
                    for (id, record) in store.iter() {
                        println!("{}", record.display_label(id));
                    }
                    println!("\n{}件", store.len());
                }
            }
        }

        Commands::Search(args) => {
            let store = storage::load_store(&config.feature_file)?;
            let filter = args.to_filter();
            let ids = filter_store(&store, &filter);

            if ids.is_empty() {
                println!("条件に一致するキャラはいません");
            } else {
                for id in &ids {
                    if let Some(record) = store.get(id) {
                        println!("{}  ({})", record.display_label(id), config.image_dir.join(id).display());
                    }
                }
                println!("\n{}件", ids.len());
            }
        }

        Commands::Stats { work, field } => {
            let store = storage::load_store(&config.feature_file)?;
            if store.is_empty() {
                println!("特徴データがありません");
                return Ok(());
            }

            let work = work.unwrap_or_default();
            let works = store.distinct_values(Field::Work);
            if !work.is_empty() && !works.contains(&work) {
                println!("作品「{}」は登録されていません", work);
                println!("登録済みの作品: {}", works.join(", "));
                return Ok(());
            }
            let records = records_for_work(&store, &work);
            println!("📊 特徴の割合（{}）\n", if work.is_empty() { "全作品" } else { work.as_str() });

            let fields: Vec<Field> = match field {
                Some(f) => vec![f.parse()?],
                None => Field::ALL.into_iter().filter(|f| !f.is_free_text()).collect(),
            };

            for field in fields {
                println!("■ {}", field.label());
                let rows = ratio_table(&records, field);
                if rows.is_empty() {
                    println!("  データがありません");
                }
                for row in rows {
                    println!("  {:<24} {:>4}件 {:>5.1}%", row.value, row.count, row.ratio);
                }
                println!();
            }
        }

        Commands::Edit { id, field, value } => {
            let mut store = storage::load_store(&config.feature_file)?;
            let field: Field = field.parse()?;

            let record = store
                .get_mut(&id)
                .ok_or_else(|| CharaAiError::UnknownImage(id.clone()))?;
            let cleared = apply_edit(record, field, &value)?;
            let new_value = record.get(field).to_string();

            storage::save_store(&config.feature_file, &store)?;

            println!("✔ {} の {} を \"{}\" に設定", id, field.label(), new_value);
            for f in cleared {
                println!("  → {} を未設定に戻しました", f.label());
            }
        }

        Commands::Select { restart } => {
            let store = storage::load_store(&config.feature_file)?;
            if store.len() < 2 {
                return Err(CharaAiError::NoImagesFound(config.feature_file.display().to_string()));
            }
            println!("💖 chara-ai - 好みの選択\n");
            session::run_interactive_selection(&store, &config.selected_file, restart)?;
        }

        Commands::Reset => {
            if storage::clear_selections(&config.selected_file)? {
                println!("✔ 選択結果を削除しました: {}", config.selected_file.display());
            } else {
                println!("選択結果は存在しません");
            }
        }

        Commands::Analyze { min_support, min_lift, limit } => {
            let store = storage::load_store(&config.feature_file)?;
            let selections = storage::load_selections(&config.selected_file)?.unwrap_or_default();
            if selections.is_empty() {
                println!("選択結果がありません。先に `chara-ai select` を実行してください");
            }

            let options = AnalysisOptions { min_support, min_lift };
            let report = preference::analyze_selections(&store, &selections, &options);

            println!("🔍 連関分析（{}枚）\n", selections.len() - report.missing.len());
            if report.rules.is_empty() {
                println!("抽出されたルールはありません");
            } else {
                println!("ルール {}件（上位{}件を表示）", report.rules.len(), limit.min(report.rules.len()));
                for rule in report.rules.rules.iter().take(limit) {
                    println!("  {}", rule);
                }
            }

            println!("\n好みの特徴: {}", if report.features.is_empty() { "なし".to_string() } else { report.features.join(", ") });
            println!("\nプロンプト:\n{}", report.prompt);
        }

        Commands::Generate { prompt, output } => {
            println!("🎨 chara-ai - 画像生成\n");

            let prompt = match prompt {
                Some(p) => p,
                None => {
                    let store = storage::load_store(&config.feature_file)?;
                    let selections = storage::load_selections(&config.selected_file)?.unwrap_or_default();
                    preference::analyze_selections(&store, &selections, &AnalysisOptions::default()).prompt
                }
            };

            println!("[1/2] 生成中... ({})", config.api_url);
            let client = generation::GenerationClient::new(
                config.api_url.clone(),
                config.generation.clone(),
                config.timeout_seconds,
            )?;
            let image = client.generate(&prompt).await?;
            println!("✔ 生成完了\n");

            println!("[2/2] 保存中...");
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let path = generation::save_image(&output_dir, &image)?;
            println!("✔ 保存: {}", path.display());
        }

        Commands::Config { set_api_url, set_classifier, show } => {
            // 環境変数による上書きは保存しない
            let mut saved = Config::load_from(&Config::config_path()?)?;

            if let Some(url) = set_api_url {
                saved.set_api_url(url)?;
                println!("✔ 画像生成APIのURLを設定しました");
            }

            if let Some(command) = set_classifier {
                saved.set_classifier(&command)?;
                println!("✔ 特徴推定コマンドを設定しました");
            }

            let config = Config::load()?;

            if show {
                println!("設定:");
                println!("  画像フォルダ: {}", config.image_dir.display());
                println!("  タグストア: {}", config.feature_file.display());
                println!("  選択結果: {}", config.selected_file.display());
                println!("  特徴推定コマンド: {}", config.classifier_command.join(" "));
                println!("  画像生成API: {}", config.api_url);
                println!("  出力フォルダ: {}", config.output_dir.display());
                println!(
                    "  生成パラメータ: steps={} sampler={} {}x{} model={}",
                    config.generation.steps,
                    config.generation.sampler_name,
                    config.generation.width,
                    config.generation.height,
                    config.generation.checkpoint
                );
                println!("  タイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}
