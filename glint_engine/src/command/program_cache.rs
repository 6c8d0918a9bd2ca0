/// Shader and program cache
///
/// Shader objects are keyed by (stage, full source text) and programs by the
/// pair of full sources, so commands whose generated text is byte-identical
/// share one linked program. Both caches are per device session and are
/// cleared when the context is lost.

use rustc_hash::FxHashMap;
use crate::device::{Device, ShaderHandle, ProgramHandle, ShaderStage};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};

/// Lines of context printed around a compile error
const ERROR_WINDOW: usize = 8;

pub struct ProgramCache {
    shaders: FxHashMap<(ShaderStage, String), ShaderHandle>,
    programs: FxHashMap<(String, String), ProgramHandle>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self {
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
        }
    }

    /// Linked program for the source pair, compiling and linking on a miss
    pub fn program(&mut self, device: &mut dyn Device, vertex: &str, fragment: &str) -> Result<ProgramHandle> {
        let key = (vertex.to_string(), fragment.to_string());
        if let Some(&program) = self.programs.get(&key) {
            return Ok(program);
        }

        let vs = self.shader(device, ShaderStage::Vertex, vertex)?;
        let fs = self.shader(device, ShaderStage::Fragment, fragment)?;

        let program = device.link_program(vs, fs).map_err(|e| {
            engine_error!("glint::ProgramCache", "{}", e);
            e
        })?;

        self.programs.insert(key, program);
        Ok(program)
    }

    fn shader(&mut self, device: &mut dyn Device, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        let key = (stage, source.to_string());
        if let Some(&shader) = self.shaders.get(&key) {
            return Ok(shader);
        }

        match device.compile_shader(stage, source) {
            Ok(shader) => {
                self.shaders.insert(key, shader);
                Ok(shader)
            }
            Err(Error::ShaderCompilationFailed { stage, log }) => {
                engine_error!("glint::ProgramCache", "Failed to compile {} shader:\n{}", stage, log);
                log_source_window(&log, source);
                Err(Error::ShaderCompilationFailed { stage, log })
            }
            Err(e) => Err(e),
        }
    }

    /// Forget every shader and program (context lost, device detached)
    pub fn clear(&mut self) {
        self.shaders.clear();
        self.programs.clear();
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self::new()
    }
}

// ===== ERROR REPORTING =====

/// Line number from the first `N:M` position in a compiler log (`M`)
pub fn error_line(log: &str) -> Option<usize> {
    log.split(|c: char| !(c.is_ascii_digit() || c == ':'))
        .filter_map(|token| {
            let (file, line) = token.trim_matches(':').split_once(':')?;
            let line = line.split(':').next()?;
            if file.is_empty() || line.is_empty() {
                return None;
            }
            file.parse::<usize>().ok()?;
            line.parse::<usize>().ok()
        })
        .next()
}

/// Log the source lines around the failing one, numbered from 1
pub fn log_source_window(log: &str, source: &str) {
    let Some(error_line) = error_line(log) else { return };

    for (index, line) in source.split('\n').enumerate() {
        let number = index + 1;
        if number.abs_diff(error_line) >= ERROR_WINDOW {
            continue;
        }
        if number == error_line {
            engine_warn!("glint::ProgramCache", "{} {}", number, line);
        } else {
            engine_debug!("glint::ProgramCache", "{} {}", number, line);
        }
    }
}

#[cfg(test)]
#[path = "program_cache_tests.rs"]
mod tests;
