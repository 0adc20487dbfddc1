use std::{
    fmt,
    path::{Path, PathBuf},
};

use naga::{
    front::glsl::{Frontend, Options},
    valid::{Capabilities, ModuleInfo, ValidationFlags, Validator},
    Binding, Handle, Module, Scalar, ShaderStage, Type, TypeInner, VectorSize,
};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::pipelines::{COLOR_LOCATION, POSITION_LOCATION};

/// Entry point name produced by the GLSL front end.
pub const ENTRY_POINT: &str = "main";

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("cannot open file \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("compilation of \"{}\" failed:\n{log}", path.display())]
    Compile { path: PathBuf, log: String },
    #[error("linking of program failed:\n{log}")]
    Link { log: String },
}

/// A compile or link report, formatted the way it is written to the error stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    CompileError { path: PathBuf, log: String },
    CompileWarning { path: PathBuf, log: String },
    LinkError { log: String },
}

impl Diagnostic {
    pub fn log(&self) {
        match self {
            Diagnostic::CompileWarning {
                ..
            } => log::warn!("{}", self),
            _ => log::error!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CompileError {
                path,
                log,
            } => write!(
                f,
                "ERROR: shader compilation of \"{}\" failed.\n== Start of compilation log\n{}\n== End of compilation log",
                path.display(),
                log.trim_end()
            ),
            Diagnostic::CompileWarning {
                path,
                log,
            } => write!(
                f,
                "WARNING: shader compilation of \"{}\".\n== Start of compilation log\n{}\n== End of compilation log",
                path.display(),
                log.trim_end()
            ),
            Diagnostic::LinkError {
                log,
            } => write!(
                f,
                "ERROR: linking of program failed.\n== Start of link log\n{}\n== End of link log",
                log.trim_end()
            ),
        }
    }
}

impl ShaderError {
    /// The report written to the error stream, if this error has one.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            ShaderError::Io {
                ..
            } => None,
            ShaderError::Compile {
                path,
                log,
            } => Some(Diagnostic::CompileError {
                path: path.clone(),
                log: log.clone(),
            }),
            ShaderError::Link {
                log,
            } => Some(Diagnostic::LinkError {
                log: log.clone(),
            }),
        }
    }
}

/// Locations of the two GLSL files making up the clock's program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    pub fn new(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> ShaderPaths {
        ShaderPaths {
            vertex: path_clean::clean(vertex.as_ref()),
            fragment: path_clean::clean(fragment.as_ref()),
        }
    }
}

impl Default for ShaderPaths {
    /// The shaders shipped in the crate's `shaders/` directory.
    fn default() -> Self {
        ShaderPaths::new(
            concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/shader_vertex.glsl"),
            concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/shader_fragment.glsl"),
        )
    }
}

/// A validated single-stage module.
#[derive(Debug)]
pub struct CompiledStage {
    pub path: PathBuf,
    pub stage: ShaderStage,
    pub module: Module,
    pub info: ModuleInfo,
    /// Non-fatal remarks, e.g. vertex attribute slots the stage ignores.
    pub warnings: Vec<String>,
}

/// Vertex and fragment stages whose interfaces were checked against each other and against the
/// vertex buffer layout.
#[derive(Debug)]
pub struct ShaderProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
}

/// Compiles GLSL `source` for `stage`. `path` only names the source in diagnostics.
pub fn compile_stage(
    path: &Path,
    source: &str,
    stage: ShaderStage,
) -> Result<CompiledStage, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        path: path.to_path_buf(),
        log,
    };
    let module = Frontend::default()
        .parse(&Options::from(stage), source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;
    if !module.entry_points.iter().any(|ep| ep.stage == stage) {
        return Err(compile_error(format!("no {:?} entry point", stage)));
    }

    let mut warnings = vec![];
    if stage == ShaderStage::Vertex {
        let inputs = stage_inputs(&module, stage);
        for (location, name) in [(POSITION_LOCATION, "position"), (COLOR_LOCATION, "color")] {
            if !inputs.iter().any(|(l, _)| *l == location) {
                warnings.push(format!(
                    "vertex attribute \"{}\" at location {} is not consumed",
                    name, location
                ));
            }
        }
    }

    Ok(CompiledStage {
        path: path.to_path_buf(),
        stage,
        module,
        info,
        warnings,
    })
}

/// Reads and compiles one stage, reporting diagnostics to the log.
pub fn load_stage(path: &Path, stage: ShaderStage) -> Result<CompiledStage, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let result = compile_stage(path, &source, stage);
    match &result {
        Ok(compiled) if !compiled.warnings.is_empty() => Diagnostic::CompileWarning {
            path: path.to_path_buf(),
            log: compiled.warnings.join("\n"),
        }
        .log(),
        Err(e) => {
            if let Some(diagnostic) = e.diagnostic() {
                diagnostic.log();
            }
        }
        _ => (),
    }
    result
}

/// Loads both stages and links them. Both files are compiled even if the first fails so every
/// diagnostic gets reported.
pub fn load_program(paths: &ShaderPaths) -> Result<ShaderProgram, ShaderError> {
    let vertex = load_stage(&paths.vertex, ShaderStage::Vertex);
    let fragment = load_stage(&paths.fragment, ShaderStage::Fragment);
    let program = link_program(vertex?, fragment?);
    if let Err(e) = &program {
        if let Some(diagnostic) = e.diagnostic() {
            diagnostic.log();
        }
    }
    program
}

/// Checks that every vertex input is fed by the vertex buffer and every fragment input is
/// written by the vertex stage with the same type.
pub fn link_program(
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<ShaderProgram, ShaderError> {
    let mut errors = vec![];
    if vertex.stage != ShaderStage::Vertex {
        errors.push(format!("\"{}\" is not a vertex stage", vertex.path.display()));
    }
    if fragment.stage != ShaderStage::Fragment {
        errors.push(format!(
            "\"{}\" is not a fragment stage",
            fragment.path.display()
        ));
    }

    let vec4 = TypeInner::Vector {
        size: VectorSize::Quad,
        scalar: Scalar::F32,
    };
    for (location, inner) in stage_inputs(&vertex.module, ShaderStage::Vertex) {
        if location != POSITION_LOCATION && location != COLOR_LOCATION {
            errors.push(format!(
                "vertex input at location {} has no matching vertex attribute",
                location
            ));
        } else if inner != vec4 {
            errors.push(format!(
                "vertex input at location {} must be vec4, found {:?}",
                location, inner
            ));
        }
    }

    let varyings = stage_outputs(&vertex.module, ShaderStage::Vertex);
    for (location, inner) in stage_inputs(&fragment.module, ShaderStage::Fragment) {
        match varyings.iter().find(|(l, _)| *l == location) {
            None => errors.push(format!(
                "fragment input at location {} is not written by the vertex stage",
                location
            )),
            Some((_, written)) if *written != inner => errors.push(format!(
                "fragment input at location {} is {:?} but the vertex stage writes {:?}",
                location, inner, written
            )),
            _ => (),
        }
    }
    if !stage_outputs(&fragment.module, ShaderStage::Fragment)
        .iter()
        .any(|(l, _)| *l == 0)
    {
        errors.push("fragment stage writes no color at location 0".to_string());
    }

    if errors.is_empty() {
        Ok(ShaderProgram {
            vertex,
            fragment,
        })
    } else {
        Err(ShaderError::Link {
            log: errors.join("\n"),
        })
    }
}

fn stage_inputs(module: &Module, stage: ShaderStage) -> Vec<(u32, TypeInner)> {
    let mut locations = vec![];
    for ep in module.entry_points.iter().filter(|ep| ep.stage == stage) {
        for arg in ep.function.arguments.iter() {
            collect_locations(module, arg.ty, arg.binding.as_ref(), &mut locations);
        }
    }
    locations
}

fn stage_outputs(module: &Module, stage: ShaderStage) -> Vec<(u32, TypeInner)> {
    let mut locations = vec![];
    for ep in module.entry_points.iter().filter(|ep| ep.stage == stage) {
        if let Some(result) = &ep.function.result {
            collect_locations(module, result.ty, result.binding.as_ref(), &mut locations);
        }
    }
    locations
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location {
            location,
            ..
        }) => out.push((*location, module.types[ty].inner.clone())),
        Some(Binding::BuiltIn(_)) => (),
        None => {
            if let TypeInner::Struct {
                members,
                ..
            } = &module.types[ty].inner
            {
                for member in members.iter() {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Watches the shader files on disk and reports when either changed.
pub struct ShaderWatcher {
    _watcher: RecommendedWatcher,
    events: flume::Receiver<notify::Event>,
    files: Vec<PathBuf>,
}

impl ShaderWatcher {
    pub fn new(paths: &ShaderPaths) -> notify::Result<ShaderWatcher> {
        let (tx, rx) = flume::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })?;

        let mut files = vec![];
        let mut dirs: Vec<PathBuf> = vec![];
        for path in [&paths.vertex, &paths.fragment] {
            let file = std::fs::canonicalize(path).map_err(notify::Error::io)?;
            // Editors often replace the file, so watch its directory
            let dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
            if !dirs.contains(&dir) {
                watcher.watch(&dir, RecursiveMode::NonRecursive)?;
                dirs.push(dir);
            }
            log::info!("Watching shader {:?}", file);
            files.push(file);
        }

        Ok(ShaderWatcher {
            _watcher: watcher,
            events: rx,
            files,
        })
    }

    /// Drains pending file events, returning true if a watched shader was touched.
    pub fn should_reload(&self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }
            changed |= event
                .paths
                .iter()
                .any(|p| self.files.iter().any(|f| f == &path_clean::clean(p)));
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    const VERTEX_SOURCE: &str = include_str!("../shaders/shader_vertex.glsl");
    const FRAGMENT_SOURCE: &str = include_str!("../shaders/shader_fragment.glsl");

    fn vertex(source: &str) -> Result<CompiledStage, ShaderError> {
        compile_stage(Path::new("vertex.glsl"), source, ShaderStage::Vertex)
    }

    fn fragment(source: &str) -> Result<CompiledStage, ShaderError> {
        compile_stage(Path::new("fragment.glsl"), source, ShaderStage::Fragment)
    }

    #[test]
    fn bundled_shaders_compile_and_link() {
        let vs = vertex(VERTEX_SOURCE).unwrap();
        let fs = fragment(FRAGMENT_SOURCE).unwrap();
        assert!(vs.warnings.is_empty());
        assert!(fs.warnings.is_empty());
        let program = link_program(vs, fs).unwrap();
        assert_eq!(program.vertex.module.entry_points[0].name, ENTRY_POINT);
        assert_eq!(program.fragment.module.entry_points[0].name, ENTRY_POINT);
    }

    #[test]
    fn bundled_shader_files_load_from_disk() {
        let program = load_program(&ShaderPaths::default()).unwrap();
        assert_eq!(program.vertex.stage, ShaderStage::Vertex);
        assert_eq!(program.fragment.stage, ShaderStage::Fragment);
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = vertex("#version 450\nvoid main() { gl_Position = ; }\n").unwrap_err();
        match err {
            ShaderError::Compile {
                path,
                log,
            } => {
                assert_eq!(path, PathBuf::from("vertex.glsl"));
                assert!(!log.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_stage(Path::new("does/not/exist.glsl"), ShaderStage::Vertex).unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
        assert!(err.diagnostic().is_none());
    }

    #[test]
    fn unused_color_attribute_is_a_warning() {
        let vs = vertex(
            "#version 450\nlayout(location = 0) in vec4 position;\nvoid main() { gl_Position = position; }\n",
        )
        .unwrap();
        assert_eq!(vs.warnings.len(), 1);
        assert!(vs.warnings[0].contains("location 1"));
    }

    #[test]
    fn fragment_input_without_varying_fails_link() {
        let fs = fragment(
            "#version 450\n\
             layout(location = 0) in vec4 interpolated_color;\n\
             layout(location = 1) in vec4 extra;\n\
             layout(location = 0) out vec4 color;\n\
             void main() { color = interpolated_color + extra; }\n",
        )
        .unwrap();
        let err = link_program(vertex(VERTEX_SOURCE).unwrap(), fs).unwrap_err();
        match err {
            ShaderError::Link {
                log,
            } => assert!(log.contains("location 1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn vertex_input_outside_buffer_layout_fails_link() {
        let vs = vertex(
            "#version 450\n\
             layout(location = 0) in vec4 position;\n\
             layout(location = 1) in vec4 color;\n\
             layout(location = 2) in vec4 normal;\n\
             layout(location = 0) out vec4 interpolated_color;\n\
             void main() { gl_Position = position + normal; interpolated_color = color; }\n",
        )
        .unwrap();
        let err = link_program(vs, fragment(FRAGMENT_SOURCE).unwrap()).unwrap_err();
        assert!(matches!(err, ShaderError::Link { ref log } if log.contains("location 2")));
    }

    #[test]
    fn swapped_stages_fail_link() {
        let vs = vertex(VERTEX_SOURCE).unwrap();
        let fs = fragment(FRAGMENT_SOURCE).unwrap();
        assert!(matches!(link_program(fs, vs), Err(ShaderError::Link { .. })));
    }

    #[test]
    fn diagnostics_use_fixed_template() {
        let compile = Diagnostic::CompileError {
            path: PathBuf::from("a.glsl"),
            log: "bad token\n".to_string(),
        };
        assert_eq!(
            compile.to_string(),
            "ERROR: shader compilation of \"a.glsl\" failed.\n== Start of compilation log\nbad token\n== End of compilation log"
        );
        let warning = Diagnostic::CompileWarning {
            path: PathBuf::from("a.glsl"),
            log: "unused".to_string(),
        };
        assert!(warning.to_string().starts_with("WARNING: shader compilation of \"a.glsl\"."));
        let link = Diagnostic::LinkError {
            log: "mismatch".to_string(),
        };
        assert_eq!(
            link.to_string(),
            "ERROR: linking of program failed.\n== Start of link log\nmismatch\n== End of link log"
        );
    }

    #[test]
    fn error_messages_carry_the_log() {
        let link = ShaderError::Link {
            log: "location 3 mismatch".to_string(),
        };
        let msg = crate::ClockError::from(link).to_string();
        assert!(msg.starts_with("linking of program failed"));
        assert!(msg.contains("location 3 mismatch"));

        let compile = ShaderError::Compile {
            path: PathBuf::from("a.glsl"),
            log: "unexpected token".to_string(),
        };
        assert!(compile.to_string().contains("unexpected token"));
    }

    fn watched_dir(name: &str) -> (PathBuf, ShaderPaths) {
        let dir = std::env::temp_dir().join(format!("bitclock_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let paths = ShaderPaths::new(dir.join("vertex.glsl"), dir.join("fragment.glsl"));
        std::fs::write(&paths.vertex, VERTEX_SOURCE).unwrap();
        std::fs::write(&paths.fragment, FRAGMENT_SOURCE).unwrap();
        (dir, paths)
    }

    fn reload_within(watcher: &ShaderWatcher, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if watcher.should_reload() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn watcher_reports_shader_writes() {
        let (dir, paths) = watched_dir("watch_write");
        let watcher = ShaderWatcher::new(&paths).unwrap();
        assert!(!reload_within(&watcher, Duration::from_millis(200)));

        std::fs::write(&paths.fragment, FRAGMENT_SOURCE).unwrap();
        assert!(reload_within(&watcher, Duration::from_secs(5)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn watcher_ignores_other_files() {
        let (dir, paths) = watched_dir("watch_other");
        let watcher = ShaderWatcher::new(&paths).unwrap();

        std::fs::write(dir.join("notes.txt"), "not a shader").unwrap();
        assert!(!reload_within(&watcher, Duration::from_millis(500)));

        std::fs::write(&paths.vertex, VERTEX_SOURCE).unwrap();
        assert!(reload_within(&watcher, Duration::from_secs(5)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn paths_are_cleaned() {
        let paths = ShaderPaths::new("shaders/../shaders/./shader_vertex.glsl", "b.glsl");
        assert_eq!(paths.vertex, PathBuf::from("shaders/shader_vertex.glsl"));
    }
}
