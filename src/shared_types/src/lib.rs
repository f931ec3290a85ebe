//! TypeScript bindings for the calid UI core are generated by `build.rs`
//! into `generated/typescript`.
