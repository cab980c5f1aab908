use std::env;
mod avl;
mod btm;
mod utils;

fn usage() {
    println!("usage: <avl|par|btm> <size>")
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        return usage();
    }
    let size = match args[2].parse::<usize>() {
        Ok(size) => size,
        Err(e) => {
            eprintln!("invalid size {}: {}", args[2], e);
            return usage();
        }
    };
    match args[1].as_ref() {
        "avl" => avl::run(size),
        "par" => avl::run_parallel(size),
        "btm" => btm::run(size),
        _ => usage(),
    }
}
