use clap::{Arg, Command};
use dronesim::logging::{init_logging, parse_log_level, LogConfig, LogOutput};
use dronesim::scenario::ScenarioConfig;
use dronesim::simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("dronesim")
        .version("0.1.0")
        .about("ドローン分隊シミュレーション (Drone Squad Simulation)")
        .long_about("敵味方の分隊に分かれたドローン群のシミュレーション\n\
                     群れ行動と状態機械による交戦・回復・シールドをティック駆動で再現します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの標準シナリオで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("ticks")
                .short('n')
                .long("ticks")
                .value_name("TICKS")
                .value_parser(clap::value_parser!(u64))
                .help("実行ティック数を上書き (60ティック = 1秒)")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(clap::value_parser!(u64))
                .help("乱数シードを上書き")
        )
        .arg(
            Arg::new("stop-on-elimination")
                .short('e')
                .long("stop-on-elimination")
                .action(clap::ArgAction::SetTrue)
                .help("どちらかの陣営が全滅した時点で終了")
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .action(clap::ArgAction::SetTrue)
                .help("終了時のワールド状態をYAMLで出力")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。-v より優先")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    // ログの初期化
    let output = match matches
        .get_one::<String>("log-output")
        .map(|s| s.parse::<LogOutput>())
        .unwrap_or(Ok(LogOutput::Console))
    {
        Ok(output) => output,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(2);
        }
    };
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| LogConfig::level_for_verbosity(verbose_level));
    let log_config = LogConfig {
        level,
        output,
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            std::process::exit(1);
        }
    };

    println!("ドローン分隊シミュレーション (Drone Squad Simulation) - dronesim v0.1.0");
    println!();

    let options = RunOptions {
        info_only: matches.get_flag("info"),
        ticks: matches.get_one::<u64>("ticks").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        stop_on_elimination: matches.get_flag("stop-on-elimination"),
        dump: matches.get_flag("dump"),
        verbose_level,
    };

    let scenario_path = matches.get_one::<String>("scenario").map(String::as_str);
    if let Err(e) = run_scenario(scenario_path, &options) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

struct RunOptions {
    info_only: bool,
    ticks: Option<u64>,
    seed: Option<u64>,
    stop_on_elimination: bool,
    dump: bool,
    verbose_level: u8,
}

/// シナリオを読み込んで実行
fn run_scenario(scenario_path: Option<&str>, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = match scenario_path {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            if options.verbose_level > 0 {
                println!("シナリオファイル読み込み完了: {}", path);
            }
            scenario
        }
        None => ScenarioConfig::default(),
    };

    if let Some(ticks) = options.ticks {
        scenario.sim.ticks = ticks;
    }
    if let Some(seed) = options.seed {
        scenario.sim.seed = seed;
    }
    scenario.validate()?;

    if options.info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, options)
}

/// シナリオの実行
fn execute_scenario(scenario: ScenarioConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let mut simulation = SimulationEngine::new(scenario, options.verbose_level);
    simulation.stop_on_elimination = options.stop_on_elimination;
    simulation.initialize()?;
    simulation.run()?;

    simulation.print_report();

    if options.dump {
        println!();
        println!("=== 最終状態 ===");
        println!("{}", serde_yaml::to_string(&simulation.snapshot())?);
    }

    Ok(())
}
