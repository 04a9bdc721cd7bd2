//! statbar 只支持 Linux (procfs / sysfs / X11)

fn main() {
    if cfg!(target_os = "linux") {
        println!("cargo:rerun-if-changed=build.rs");
    } else {
        println!("cargo:warning=statbar can only be built on Linux!");
        std::process::exit(1);
    }
}
