/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use bpaf::{Args, Bpaf};
use dark_theme::Theme;
use log::{error, info};
use site_fixes::IndexError;
use url::Url;

#[derive(Bpaf, Clone, Debug)]
#[bpaf(options, version)]
pub(crate) struct CmdArgs {
    /// Theme settings (JSON). Defaults to darkshell/theme.json in the user's
    /// configuration directory.
    #[bpaf(long, argument("theme.json"))]
    theme: Option<PathBuf>,

    /// Dynamic theme fixes configuration.
    #[bpaf(long, argument("fixes.config"))]
    fixes: Option<PathBuf>,

    /// List of sites that are dark already and are left alone.
    #[bpaf(long("dark-sites"), argument("sites.list"))]
    dark_sites: Option<PathBuf>,

    /// Inline style attributes of the page, one `selector<TAB>style` per line.
    #[bpaf(long("inline-styles"), argument("styles.tsv"))]
    inline_styles: Option<PathBuf>,

    /// URL of the page, used to resolve relative URLs and look up fixes.
    #[bpaf(long, argument("URL"))]
    url: Option<Url>,

    /// Stylesheet linked by the page. Its rules are treated as unreadable and
    /// fetched out of band, like a cross-origin sheet.
    #[bpaf(long("link"), argument("URL"))]
    links: Vec<Url>,

    /// Style the page as a framed document.
    #[bpaf(long)]
    iframe: bool,

    /// Also emit the style used while the page's stylesheets load.
    #[bpaf(long)]
    fallback: bool,

    /// Use the strict variant of the fallback style.
    #[bpaf(long)]
    strict: bool,

    /// Content of the page's theme-color meta element.
    #[bpaf(long("meta-theme-color"), argument("COLOR"))]
    meta_theme_color: Option<String>,

    /// Write the stylesheet to a file instead of stdout.
    #[bpaf(short('o'), long, argument("out.css"))]
    output: Option<PathBuf>,

    /// Contents of the page's `<style>` elements, in document order.
    #[bpaf(positional("STYLESHEET"))]
    stylesheets: Vec<PathBuf>,
}

pub(crate) struct DarkshellPrefs {
    pub theme: Theme,
    pub page_url: Option<Url>,
    pub fixes_path: Option<PathBuf>,
    pub dark_sites_path: Option<PathBuf>,
    pub inline_styles_path: Option<PathBuf>,
    pub links: Vec<Url>,
    pub stylesheets: Vec<PathBuf>,
    pub is_iframe: bool,
    pub fallback: bool,
    pub strict: bool,
    pub meta_theme_color: Option<String>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum PrefsError {
    Io { path: PathBuf, error: io::Error },
    Theme { path: PathBuf, error: serde_json::Error },
    Index(IndexError),
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefsError::Io { path, error } => write!(f, "{}: {error}", path.display()),
            PrefsError::Theme { path, error } => {
                write!(f, "invalid theme in {}: {error}", path.display())
            },
            PrefsError::Index(error) => write!(f, "invalid site fixes: {error}"),
        }
    }
}

impl std::error::Error for PrefsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrefsError::Io { error, .. } => Some(error),
            PrefsError::Theme { error, .. } => Some(error),
            PrefsError::Index(error) => Some(error),
        }
    }
}

impl From<IndexError> for PrefsError {
    fn from(error: IndexError) -> Self {
        PrefsError::Index(error)
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, PrefsError> {
    fs::read_to_string(path).map_err(|error| PrefsError::Io {
        path: path.to_owned(),
        error,
    })
}

fn default_theme_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("darkshell").join("theme.json"))
}

/// Load the theme from `path`, or from the default location. Only a missing
/// default file falls back to the built-in theme.
pub(crate) fn load_theme(path: Option<&Path>) -> Result<Theme, PrefsError> {
    let (path, explicit) = match path {
        Some(path) => (path.to_owned(), true),
        None => match default_theme_path() {
            Some(path) => (path, false),
            None => return Ok(Theme::default()),
        },
    };
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(error) if !explicit && error.kind() == io::ErrorKind::NotFound => {
            info!("No theme at {}, using the default theme", path.display());
            return Ok(Theme::default());
        },
        Err(error) => return Err(PrefsError::Io { path, error }),
    };
    Theme::from_json(&text).map_err(|error| PrefsError::Theme { path, error })
}

impl TryFrom<CmdArgs> for DarkshellPrefs {
    type Error = PrefsError;

    fn try_from(args: CmdArgs) -> Result<Self, PrefsError> {
        Ok(DarkshellPrefs {
            theme: load_theme(args.theme.as_deref())?,
            page_url: args.url,
            fixes_path: args.fixes,
            dark_sites_path: args.dark_sites,
            inline_styles_path: args.inline_styles,
            links: args.links,
            stylesheets: args.stylesheets,
            is_iframe: args.iframe,
            fallback: args.fallback,
            strict: args.strict,
            meta_theme_color: args.meta_theme_color,
            output: args.output,
        })
    }
}

pub(crate) enum ArgumentParsingResult {
    Prefs(Box<DarkshellPrefs>),
    Exit,
    ErrorParsing,
}

pub(crate) fn parse_command_line_arguments(args: Vec<String>) -> ArgumentParsingResult {
    let args_without_binary = args.split_first().map_or(&[][..], |(_, rest)| rest);
    let cmd_args = match cmd_args().run_inner(Args::from(args_without_binary)) {
        Ok(cmd_args) => cmd_args,
        Err(error) => {
            error.print_message(80);
            return if error.exit_code() == 0 {
                ArgumentParsingResult::Exit
            } else {
                ArgumentParsingResult::ErrorParsing
            };
        },
    };
    match DarkshellPrefs::try_from(cmd_args) {
        Ok(prefs) => ArgumentParsingResult::Prefs(Box::new(prefs)),
        Err(error) => {
            error!("{error}");
            ArgumentParsingResult::ErrorParsing
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_arguments() {
        let args = cmd_args()
            .run_inner(&[
                "--url",
                "https://example.com/docs/",
                "--link",
                "file:///tmp/site.css",
                "--strict",
                "-o",
                "out.css",
                "a.css",
                "b.css",
            ])
            .unwrap();
        assert_eq!(args.url.unwrap().as_str(), "https://example.com/docs/");
        assert_eq!(args.links.len(), 1);
        assert!(args.strict);
        assert!(!args.iframe);
        assert_eq!(args.output, Some(PathBuf::from("out.css")));
        assert_eq!(args.stylesheets, [PathBuf::from("a.css"), PathBuf::from("b.css")]);
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(cmd_args().run_inner(&["--url", "not a url"]).is_err());
    }

    #[test]
    fn explicit_theme_must_exist() {
        let missing = Path::new("/nonexistent/darkshell/theme.json");
        assert!(matches!(load_theme(Some(missing)), Err(PrefsError::Io { .. })));
    }
}
