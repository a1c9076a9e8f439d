//! Command-line definition of the `quill` binary.
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

fn corpus_arg() -> Arg {
    Arg::new("corpus")
        .help("Feature corpus: a .json document or a TSV table")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

/// Arguments shared by every experiment subcommand.
fn common_args(command: Command) -> Command {
    command
        .arg(corpus_arg())
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON run configuration. Flags override its values.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write the JSON report here instead of stdout")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("groups")
                .short('g')
                .long("groups")
                .help("Comma-separated feature groups to keep, e.g. word_length,readability")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("authors")
                .short('n')
                .long("authors")
                .help("Number of authors sampled per cross-validation sample")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed of the dataset partitioner")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("heavy")
                .long("heavy")
                .help("Heavy cross-validation (80 samples x 13 splits) instead of light")
                .action(ArgAction::SetTrue),
        )
}

fn attack_arg() -> Arg {
    Arg::new("attack")
        .short('a')
        .long("attack")
        .help("Hold out attack texts instead of rotating the authors' own texts")
        .action(ArgAction::SetTrue)
}

fn model_arg() -> Arg {
    Arg::new("model")
        .short('m')
        .long("model")
        .help("Classifier to use. Overrides the model in the configuration file.")
        .value_parser(["svm", "knn", "tree", "adaboost", "gbdt"])
}

pub fn build_cli() -> Command {
    Command::new("quill")
        .version(clap::crate_version!())
        .about("Quill - stylometric authorship attribution experiments")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            common_args(Command::new("survey"))
                .about("Compare the accuracy of several classifiers on shared splits")
                .arg(attack_arg())
                .arg(
                    Arg::new("models")
                        .long("models")
                        .help("Comma-separated classifiers to compare")
                        .value_delimiter(',')
                        .value_parser(["svm", "knn", "tree", "adaboost", "gbdt"]),
                ),
        )
        .subcommand(
            common_args(Command::new("rank"))
                .about("Precision at rank of one classifier")
                .arg(attack_arg())
                .arg(model_arg()),
        )
        .subcommand(
            common_args(Command::new("select"))
                .about("Greedy search for the best subset of feature groups")
                .arg(attack_arg())
                .arg(model_arg())
                .arg(
                    Arg::new("direction")
                        .short('d')
                        .long("direction")
                        .help("Grow from the start groups or shrink from them")
                        .value_parser(["bottom-up", "top-down"])
                        .default_value("bottom-up"),
                )
                .arg(
                    Arg::new("start")
                        .short('s')
                        .long("start")
                        .help(
                            "Comma-separated groups the search starts from. Defaults to none \
                             for bottom-up and to every group for top-down.",
                        )
                        .value_delimiter(','),
                ),
        )
        .subcommand(
            common_args(Command::new("features"))
                .about("Score feature groups alone or by leaving each one out")
                .arg(attack_arg())
                .arg(model_arg())
                .arg(
                    Arg::new("method")
                        .long("method")
                        .help("Ranking method")
                        .value_parser(["solo", "dropout"])
                        .default_value("solo"),
                ),
        )
        .subcommand(
            common_args(Command::new("deobfuscate"))
                .about("Attribute obfuscated texts with and without de-obfuscation")
                .arg(model_arg())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .help("never, detect, always, a comma-separated list of them, or all")
                        .default_value("all"),
                )
                .arg(
                    Arg::new("samples")
                        .long("samples")
                        .help("Author samples to draw leave-one-out rounds from")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
}
